//! Logger bootstrap for the binaries.
//!
//! The library only talks to the `log` facade; `cli` and `http` call
//! [`init_logging`] once at startup. Output goes to stderr so it never mixes
//! with CLI results on stdout.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};
use log::info;
use std::sync::OnceLock;

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

/// Start logging to stderr. `RUST_LOG` overrides `default_level`.
///
/// Repeated calls are no-ops.
pub fn init_logging(default_level: &str) -> Result<(), FlexiLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let handle = Logger::try_with_env_or_str(default_level)?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()?;
    let _ = LOGGER.set(handle);
    info!(
        "event=app_start module=logging status=ok version={}",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}
