//! Logging initialization
//!
//! Thin wrapper over `env_logger`/`log`, following the same shape as the
//! rest of the ecosystem: subsystems call `log::debug!`/`log::warn!`
//! directly, and this module only owns process-wide init.

use log::{debug, error, info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate. `RUST_LOG` controls
/// verbosity; defaults to `info` for the `bts-ctl` binary.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}
