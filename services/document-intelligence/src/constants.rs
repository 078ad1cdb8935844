pub const OCP_APIM_SUBSCRIPTION_KEY: &str = "Ocp-Apim-Subscription-Key";
pub const OPERATION_LOCATION: &str = "Operation-Location";

pub const DEFAULT_API_VERSION: &str = "2024-11-30";
pub const DEFAULT_MODEL_ID: &str = "prebuilt-read";

// Env values read by `Config::from_env`.
pub const AZURE_VISION_ENDPOINT: &str = "AZURE_VISION_ENDPOINT";
pub const AZURE_VISION_KEY: &str = "AZURE_VISION_KEY";
pub const AZURE_VISION_MODEL_ID: &str = "AZURE_VISION_MODEL_ID";
