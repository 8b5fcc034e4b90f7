//! The process-wide default configuration.
//!
//! Built lazily on first use from the discovered configuration file and
//! read-only after publication; construct a fresh [`Config`] to observe
//! changed files or environment.

use std::sync::{Mutex, OnceLock, PoisonError};

use fontrules::Config;

use crate::error::Error;

static DEFAULT: OnceLock<Config> = OnceLock::new();
static BUILD: Mutex<()> = Mutex::new(());

/// The shared default config, building it on first call.
///
/// Construction runs under a lock so exactly one thread parses the
/// configuration; every caller observes the same published handle.
pub fn default_config() -> Result<&'static Config, Error> {
    if let Some(config) = DEFAULT.get() {
        return Ok(config);
    }
    let _build = BUILD.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(config) = DEFAULT.get() {
        return Ok(config);
    }
    let config = crate::init()?;
    Ok(DEFAULT.get_or_init(|| config))
}
