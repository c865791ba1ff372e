use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Logs to stderr and appends the same lines to `log_file`.
///
/// `RUST_LOG` wins over `level` when set. Keep the returned guard alive until
/// exit or buffered file lines are lost.
pub fn init_logging(level: &str, log_file: &Path) -> Result<WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("invalid log level")?,
    };

    let (dir, name) = split_log_path(log_file)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .context("open log file")?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;

    Ok(guard)
}

fn split_log_path(log_file: &Path) -> Result<(&Path, &str)> {
    let name = log_file
        .file_name()
        .and_then(|n| n.to_str())
        .context("log file path must end in a valid utf-8 file name")?;
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("trading_bot.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "trading_bot.log");

        let (dir, name) = split_log_path(Path::new("/var/log/bot/futures.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/bot"));
        assert_eq!(name, "futures.log");

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
