use std::fmt::{Debug, Formatter};

use sasflow_core::utils::Redact;
use sasflow_core::{Context, Result};

use crate::constants::*;

/// Config for a Document Intelligence resource.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Resource endpoint such as `https://ocr.cognitiveservices.azure.com/`.
    ///
    /// - env value: `AZURE_VISION_ENDPOINT`
    pub endpoint: String,
    /// Subscription key sent as `Ocp-Apim-Subscription-Key`.
    ///
    /// - env value: `AZURE_VISION_KEY`
    pub key: String,
    /// - env value: `AZURE_VISION_MODEL_ID`
    /// - default: `prebuilt-read`
    pub model_id: String,
    /// REST api version, `2024-11-30` by default.
    pub api_version: String,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("key", &Redact::from(&self.key))
            .field("model_id", &self.model_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl Config {
    /// Create a config for `endpoint` using the read model.
    pub fn new(endpoint: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            key: key.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Load config from the environment visible to `ctx`.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let mut cfg = Self::new(
            ctx.env_var_required(AZURE_VISION_ENDPOINT)?,
            ctx.env_var_required(AZURE_VISION_KEY)?,
        );
        if let Some(v) = ctx.env_var(AZURE_VISION_MODEL_ID).filter(|v| !v.is_empty()) {
            cfg.model_id = v;
        }
        Ok(cfg)
    }

    /// The url analyze requests are posted to.
    pub fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.model_id,
            self.api_version
        )
    }
}
