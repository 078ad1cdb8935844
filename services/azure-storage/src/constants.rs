use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Headers used in azure services.
pub const X_MS_DATE: &str = "x-ms-date";
pub const X_MS_VERSION: &str = "x-ms-version";
pub const X_MS_BLOB_TYPE: &str = "x-ms-blob-type";
pub const X_MS_TAGS: &str = "x-ms-tags";

// Service versions.
pub const BLOB_UPLOAD_VERSION: &str = "2020-04-08";
pub const DELEGATION_KEY_VERSION: &str = "2020-12-06";
pub const SAS_STORAGE_VERSION: &str = "2020-12-06";

// User delegation SAS constants.
pub const SAS_SIGNED_KEY_SERVICE: &str = "b";
pub const SAS_SIGNED_PROTOCOL: &str = "https";
pub const SAS_SIGNED_RESOURCE_BLOB: &str = "b";

// Identity defaults.
pub const AZURE_PUBLIC_CLOUD: &str = "https://login.microsoftonline.com/";
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";
pub const DEFAULT_STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
/// Tokens are refreshed this long before their reported expiry.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

// Env values read by `Config::from_env`.
pub const AZURE_STORAGE_ENDPOINT_URL: &str = "AZURE_STORAGE_ENDPOINT_URL";
pub const AZURE_STORAGE_TENANT_ID: &str = "AZURE_STORAGE_TENANT_ID";
pub const AZURE_STORAGE_GRANT_TYPE: &str = "AZURE_STORAGE_GRANT_TYPE";
pub const AZURE_STORAGE_CLIENT_ID: &str = "AZURE_STORAGE_CLIENT_ID";
pub const AZURE_STORAGE_CLIENT_SECRET: &str = "AZURE_STORAGE_CLIENT_SECRET";
pub const AZURE_STORAGE_SCOPE: &str = "AZURE_STORAGE_SCOPE";
pub const AZURE_STORAGE_ACCOUNT_URL: &str = "AZURE_STORAGE_ACCOUNT_URL";
pub const AZURE_STORAGE_ACCOUNT_CONTAINER_NAME: &str = "AZURE_STORAGE_ACCOUNT_CONTAINER_NAME";
pub const AZURE_STORAGE_ACCOUNT_PREFIX: &str = "AZURE_STORAGE_ACCOUNT_PREFIX";
pub const AZURE_STORAGE_FILE_TAGS: &str = "AZURE_STORAGE_FILE_TAGS";
pub const AZURE_STORAGE_SAS_VALID_HOURS: &str = "AZURE_STORAGE_SAS_VALID_HOURS";

/// Characters left unescaped in the `sig` query value: only unreserved ones.
///
/// `/`, `+` and `=` from the base64 signature are always escaped.
pub static SAS_SIGNATURE_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
