use std::time::Duration;

use sasflow_core::{Context, Error, PollPolicy, Result};

use crate::{azure, ocr};

const SASFLOW_POLL_INTERVAL_SECS: &str = "SASFLOW_POLL_INTERVAL_SECS";
const SASFLOW_POLL_MAX_INTERVAL_SECS: &str = "SASFLOW_POLL_MAX_INTERVAL_SECS";
const SASFLOW_POLL_TIMEOUT_SECS: &str = "SASFLOW_POLL_TIMEOUT_SECS";

/// Everything the pipeline needs, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Identity and storage account settings.
    pub storage: azure::Config,
    /// Document Intelligence resource settings.
    pub ocr: ocr::Config,
    /// How the analyze operation is polled.
    pub poll: PollPolicy,
}

impl Config {
    /// Load the configuration from the environment visible to `ctx`.
    ///
    /// Fails with `ConfigInvalid` naming the first missing or malformed
    /// variable.
    pub fn from_context(ctx: &Context) -> Result<Self> {
        let interval = secs(ctx, SASFLOW_POLL_INTERVAL_SECS, 5)?;
        let max_interval = secs(ctx, SASFLOW_POLL_MAX_INTERVAL_SECS, 30)?;
        let timeout = secs(ctx, SASFLOW_POLL_TIMEOUT_SECS, 300)?;

        Ok(Self {
            storage: azure::Config::from_env(ctx)?,
            ocr: ocr::Config::from_env(ctx)?,
            poll: PollPolicy::exponential(interval, max_interval, timeout),
        })
    }
}

fn secs(ctx: &Context, key: &str, default: u64) -> Result<Duration> {
    match ctx.env_var_parse(key, Some(default))? {
        0 => Err(Error::config_invalid(format!("{key} must be greater than zero"))),
        v => Ok(Duration::from_secs(v)),
    }
}
