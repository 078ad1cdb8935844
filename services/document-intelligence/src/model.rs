use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeRequest<'a> {
    pub url_source: &'a str,
}

/// Status of an analyze operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum OperationStatus {
    NotStarted,
    Running,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyzeOperation {
    pub status: OperationStatus,
    pub analyze_result: Option<AnalyzeResult>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct OperationError {
    pub code: String,
    pub message: String,
}

impl OperationError {
    pub fn describe(&self) -> String {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => format!("{}: {}", self.code, self.message),
            (false, true) => self.code.clone(),
            (true, false) => self.message.clone(),
            (true, true) => "analyze operation failed".to_string(),
        }
    }
}

/// The part of an analyze result the pipeline consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzeResult {
    /// Model that produced the result.
    pub model_id: String,
    /// Api version that produced the result.
    pub api_version: String,
    /// Concatenated text of the whole document, in reading order.
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"status":"notStarted"}"#, OperationStatus::NotStarted)]
    #[test_case(r#"{"status":"running"}"#, OperationStatus::Running)]
    #[test_case(r#"{"status":"failed"}"#, OperationStatus::Failed)]
    #[test_case(r#"{"status":"canceled"}"#, OperationStatus::Canceled)]
    #[test_case(r#"{"status":"paused"}"#, OperationStatus::Unknown)]
    fn test_operation_status(body: &str, expected: OperationStatus) {
        let op: AnalyzeOperation = serde_json::from_str(body).unwrap();
        assert_eq!(op.status, expected);
        assert!(op.analyze_result.is_none());
    }

    #[test]
    fn test_succeeded_operation() {
        let body = r#"{
            "status": "succeeded",
            "createdDateTime": "2024-01-01T00:00:01Z",
            "lastUpdatedDateTime": "2024-01-01T00:00:04Z",
            "analyzeResult": {
                "apiVersion": "2024-11-30",
                "modelId": "prebuilt-read",
                "stringIndexType": "textElements",
                "content": "Jane Doe\nSenior Engineer",
                "pages": []
            }
        }"#;
        let op: AnalyzeOperation = serde_json::from_str(body).unwrap();

        assert_eq!(op.status, OperationStatus::Succeeded);
        assert_eq!(
            op.analyze_result.unwrap(),
            AnalyzeResult {
                model_id: "prebuilt-read".to_string(),
                api_version: "2024-11-30".to_string(),
                content: "Jane Doe\nSenior Engineer".to_string(),
            }
        );
    }

    #[test]
    fn test_failed_operation() {
        let body = r#"{"status":"failed","error":{"code":"InvalidRequest","message":"Invalid request.","innererror":{"code":"InvalidContent"}}}"#;
        let op: AnalyzeOperation = serde_json::from_str(body).unwrap();

        assert_eq!(op.status, OperationStatus::Failed);
        assert_eq!(
            op.error.unwrap().describe(),
            "InvalidRequest: Invalid request."
        );
    }
}
