use std::{
    fs::{self, File},
    path::PathBuf,
    sync::Mutex,
};

use color_eyre::{Result, eyre::WrapErr};
use directories::BaseDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE: &str = "dui.log";

/// Installs the global subscriber. The terminal belongs to the UI, so events
/// go to a file in the user cache directory; `RUST_LOG` overrides the level
/// picked from `-v`. Returns the log file path when one could be opened.
pub fn init(verbosity: u8) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let log_path = log_file_path();
    let file = match &log_path {
        Some(path) => Some(
            File::create(path)
                .wrap_err_with(|| format!("failed to open log file {}", path.display()))?,
        ),
        None => None,
    };
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default())
        .with(file_layer)
        .try_init()
        .wrap_err("failed to install tracing subscriber")?;

    Ok(log_path)
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn log_file_path() -> Option<PathBuf> {
    let dir = BaseDirs::new()?.cache_dir().join("dui");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(LOG_FILE))
}

#[cfg(test)]
mod tests {
    use super::default_directive;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(2), "debug");
        assert_eq!(default_directive(9), "trace");
    }
}
