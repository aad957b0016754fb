//! Logging setup. Records go to stderr so stdout stays clean for command output.

use std::io::stderr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339_seconds;
use log::{LevelFilter, debug};

/// Set once the global logger has been installed.
static LOGGER_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global logger at `level`.
///
/// Calling it again is a no-op.
pub fn initialize(level: LevelFilter) -> Result<()> {
    if LOGGER_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    Dispatch::new()
        .level(level)
        // reqwest/hyper internals are too chatty below warn
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("rustls", LevelFilter::Warn)
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} {level} {target}] {message}",
                date = format_rfc3339_seconds(SystemTime::now()),
                level = colors.color(record.level()),
                target = record.target(),
                message = message,
            ))
        })
        .chain(stderr())
        .apply()
        .map_err(|e| anyhow!("failed to initialize logger: {e}"))?;

    debug!("logger initialized at {level}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_is_noop() {
        initialize(LevelFilter::Warn).unwrap();
        initialize(LevelFilter::Debug).unwrap();
        assert!(LOGGER_INITIALIZED.load(Ordering::SeqCst));
    }
}
