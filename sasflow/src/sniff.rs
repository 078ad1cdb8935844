use sasflow_core::{Error, Result};

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
];

/// Detect the content type of a document from its leading bytes.
///
/// Only PDF, PNG and JPEG are accepted; anything else fails with
/// `RequestInvalid`.
pub fn sniff_content_type(content: &[u8]) -> Result<&'static str> {
    SIGNATURES
        .iter()
        .find(|(magic, _)| content.starts_with(magic))
        .map(|(_, content_type)| *content_type)
        .ok_or_else(|| {
            Error::request_invalid("unsupported document type, expected PDF, PNG or JPEG")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sasflow_core::ErrorKind;
    use test_case::test_case;

    #[test_case(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3", "application/pdf"; "pdf")]
    #[test_case(b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR", "image/png"; "png")]
    #[test_case(b"\xff\xd8\xff\xe0\x00\x10JFIF", "image/jpeg"; "jpeg")]
    fn test_supported(content: &[u8], expected: &str) {
        assert_eq!(sniff_content_type(content).unwrap(), expected);
    }

    #[test_case(b""; "empty")]
    #[test_case(b"GIF89a"; "gif")]
    #[test_case(b"PK\x03\x04"; "zip")]
    #[test_case(b"%PD"; "truncated pdf")]
    fn test_unsupported(content: &[u8]) {
        let err = sniff_content_type(content).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }
}
