//! Environment variable-based configuration overrides

use super::SlotkitConfig;
use crate::error::{SlotError, SlotResult};
use std::env;
use std::time::Duration;

/// Maximum automatic retries
pub const ENV_MAX_ATTEMPTS: &str = "SLOTKIT_MAX_ATTEMPTS";
/// Delay before the first retry, as a humantime string
pub const ENV_RETRY_DELAY: &str = "SLOTKIT_RETRY_DELAY";
/// Cache staleness window, as a humantime string
pub const ENV_STALE_TIME: &str = "SLOTKIT_STALE_TIME";
/// Log level
pub const ENV_LOG_LEVEL: &str = "SLOTKIT_LOG_LEVEL";

/// Apply `SLOTKIT_*` environment variables on top of `config`
pub fn load_from_env(config: &mut SlotkitConfig) -> SlotResult<()> {
    apply_overrides(config, |name| env::var(name).ok())
}

/// Apply overrides looked up by variable name
///
/// Unset variables leave the config untouched; malformed ones are errors.
pub fn apply_overrides<F>(config: &mut SlotkitConfig, lookup: F) -> SlotResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_MAX_ATTEMPTS) {
        config.retry.max_attempts = raw.trim().parse().map_err(|_| {
            SlotError::config(format!("Invalid {} value '{}'", ENV_MAX_ATTEMPTS, raw))
        })?;
    }

    if let Some(raw) = lookup(ENV_RETRY_DELAY) {
        config.retry.delay = parse_duration(ENV_RETRY_DELAY, &raw)?;
    }

    if let Some(raw) = lookup(ENV_STALE_TIME) {
        config.cache.stale_time = parse_duration(ENV_STALE_TIME, &raw)?;
    }

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }

    Ok(())
}

fn parse_duration(name: &str, raw: &str) -> SlotResult<Duration> {
    humantime_serde::re::humantime::parse_duration(raw.trim()).map_err(|e| {
        SlotError::config(format!("Invalid {} value '{}': {}", name, raw, e))
    })
}
