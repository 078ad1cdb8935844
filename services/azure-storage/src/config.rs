use std::fmt::{Debug, Formatter};

use sasflow_core::utils::Redact;
use sasflow_core::{Context, Error, Result};

use crate::constants::*;

/// Config carries all the configuration for the identity exchange and the
/// storage account documents are uploaded to.
///
/// It is built once and handed to components by value. Components never read
/// the environment themselves.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity authority host, ending with `/`.
    ///
    /// - env value: `AZURE_STORAGE_ENDPOINT_URL`
    /// - default: `https://login.microsoftonline.com/`
    pub authority_host: String,
    /// Tenant the service principal belongs to.
    ///
    /// - env value: `AZURE_STORAGE_TENANT_ID`
    pub tenant_id: String,
    /// OAuth2 grant type.
    ///
    /// - env value: `AZURE_STORAGE_GRANT_TYPE`
    /// - default: `client_credentials`
    pub grant_type: String,
    /// - env value: `AZURE_STORAGE_CLIENT_ID`
    pub client_id: String,
    /// - env value: `AZURE_STORAGE_CLIENT_SECRET`
    pub client_secret: String,
    /// - env value: `AZURE_STORAGE_SCOPE`
    /// - default: `https://storage.azure.com/.default`
    pub scope: String,
    /// Storage resource root such as `https://acct.blob.core.windows.net/`.
    ///
    /// - env value: `AZURE_STORAGE_ACCOUNT_URL`
    pub account_url: String,
    /// - env value: `AZURE_STORAGE_ACCOUNT_CONTAINER_NAME`
    pub container: String,
    /// Virtual directory inside the container; may be empty.
    ///
    /// - env value: `AZURE_STORAGE_ACCOUNT_PREFIX`
    pub prefix: String,
    /// Tag string sent as `x-ms-tags`, for example `project=ocr&team=hr`.
    ///
    /// - env value: `AZURE_STORAGE_FILE_TAGS`
    pub file_tags: Option<String>,
    /// How long requested delegation keys stay valid, in hours.
    ///
    /// - env value: `AZURE_STORAGE_SAS_VALID_HOURS`
    pub sas_valid_hours: u32,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("authority_host", &self.authority_host)
            .field("tenant_id", &self.tenant_id)
            .field("grant_type", &self.grant_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("scope", &self.scope)
            .field("account_url", &self.account_url)
            .field("container", &self.container)
            .field("prefix", &self.prefix)
            .field("file_tags", &self.file_tags)
            .field("sas_valid_hours", &self.sas_valid_hours)
            .finish()
    }
}

impl Config {
    /// Load config from the environment visible to `ctx`.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let sas_valid_hours: u32 = ctx.env_var_parse(AZURE_STORAGE_SAS_VALID_HOURS, None)?;
        if sas_valid_hours == 0 {
            return Err(Error::config_invalid(format!(
                "{AZURE_STORAGE_SAS_VALID_HOURS} must be greater than zero"
            )));
        }

        Ok(Self {
            authority_host: ctx
                .env_var(AZURE_STORAGE_ENDPOINT_URL)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| AZURE_PUBLIC_CLOUD.to_string()),
            tenant_id: ctx.env_var_required(AZURE_STORAGE_TENANT_ID)?,
            grant_type: ctx
                .env_var(AZURE_STORAGE_GRANT_TYPE)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_GRANT_TYPE.to_string()),
            client_id: ctx.env_var_required(AZURE_STORAGE_CLIENT_ID)?,
            client_secret: ctx.env_var_required(AZURE_STORAGE_CLIENT_SECRET)?,
            scope: ctx
                .env_var(AZURE_STORAGE_SCOPE)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_STORAGE_SCOPE.to_string()),
            account_url: ctx.env_var_required(AZURE_STORAGE_ACCOUNT_URL)?,
            container: ctx.env_var_required(AZURE_STORAGE_ACCOUNT_CONTAINER_NAME)?,
            prefix: ctx.env_var(AZURE_STORAGE_ACCOUNT_PREFIX).unwrap_or_default(),
            file_tags: ctx
                .env_var(AZURE_STORAGE_FILE_TAGS)
                .filter(|v| !v.is_empty()),
            sas_valid_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sasflow_core::{ErrorKind, StaticEnv};

    fn envs() -> Vec<(&'static str, &'static str)> {
        vec![
            (AZURE_STORAGE_TENANT_ID, "tenant"),
            (AZURE_STORAGE_CLIENT_ID, "client"),
            (AZURE_STORAGE_CLIENT_SECRET, "client-secret-value"),
            (AZURE_STORAGE_ACCOUNT_URL, "https://acct.blob.core.windows.net/"),
            (AZURE_STORAGE_ACCOUNT_CONTAINER_NAME, "resumes"),
            (AZURE_STORAGE_SAS_VALID_HOURS, "1"),
        ]
    }

    #[test]
    fn test_from_env_defaults() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs(envs()));
        let cfg = Config::from_env(&ctx).unwrap();

        assert_eq!(cfg.authority_host, "https://login.microsoftonline.com/");
        assert_eq!(cfg.grant_type, "client_credentials");
        assert_eq!(cfg.scope, "https://storage.azure.com/.default");
        assert_eq!(cfg.prefix, "");
        assert_eq!(cfg.file_tags, None);
        assert_eq!(cfg.sas_valid_hours, 1);
    }

    #[test]
    fn test_from_env_overrides() {
        let mut pairs = envs();
        pairs.push((AZURE_STORAGE_ENDPOINT_URL, "https://login.example.com/"));
        pairs.push((AZURE_STORAGE_ACCOUNT_PREFIX, "inbox"));
        pairs.push((AZURE_STORAGE_FILE_TAGS, "project=ocr"));
        let ctx = Context::new().with_env(StaticEnv::from_pairs(pairs));
        let cfg = Config::from_env(&ctx).unwrap();

        assert_eq!(cfg.authority_host, "https://login.example.com/");
        assert_eq!(cfg.prefix, "inbox");
        assert_eq!(cfg.file_tags.as_deref(), Some("project=ocr"));
    }

    #[test]
    fn test_from_env_missing_secret() {
        let pairs = envs()
            .into_iter()
            .filter(|(k, _)| *k != AZURE_STORAGE_CLIENT_SECRET);
        let ctx = Context::new().with_env(StaticEnv::from_pairs(pairs));
        let err = Config::from_env(&ctx).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains(AZURE_STORAGE_CLIENT_SECRET));
    }

    #[test]
    fn test_from_env_zero_hours() {
        let mut pairs = envs();
        pairs.retain(|(k, _)| *k != AZURE_STORAGE_SAS_VALID_HOURS);
        pairs.push((AZURE_STORAGE_SAS_VALID_HOURS, "0"));
        let ctx = Context::new().with_env(StaticEnv::from_pairs(pairs));
        let err = Config::from_env(&ctx).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs(envs()));
        let cfg = Config::from_env(&ctx).unwrap();

        let out = format!("{cfg:?}");
        assert!(!out.contains("client-secret-value"));
        assert!(out.contains("cli***lue"));
    }
}
