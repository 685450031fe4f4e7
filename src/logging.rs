use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

impl LogLevel {
	/// tracing has no CRITICAL, it folds into error
	pub fn as_filter(self) -> &'static str {
		match self {
			LogLevel::Debug => "debug",
			LogLevel::Info => "info",
			LogLevel::Warning => "warn",
			LogLevel::Error | LogLevel::Critical => "error",
		}
	}
}

/// Build the filter: DOMAIN_STRESS_LOG or RUST_LOG when set, else the CLI level.
///
/// Dependencies stay at warn so `--log-level debug` is not drowned in
/// connection pool chatter.
pub fn build_filter(level: LogLevel) -> EnvFilter {
	let fallback = || EnvFilter::new(format!("warn,domain_stress={}", level.as_filter()));
	std::env::var("DOMAIN_STRESS_LOG")
		.or_else(|_| std::env::var("RUST_LOG"))
		.map_or_else(
			|_| fallback(),
			|value| EnvFilter::try_new(value).unwrap_or_else(|_| fallback()),
		)
}

/// Path of the run log file, e.g. `logs/stress_test_20260416_101500.log`.
pub fn log_file_path(dir: &str, timestamp: &str) -> PathBuf {
	Path::new(dir).join(format!("stress_test_{}.log", timestamp))
}

/// Install the global subscriber: console output plus an optional plain-text file.
///
/// A second call leaves the first subscriber in place.
pub fn init_logging(level: LogLevel, log_file: Option<&Path>) -> Result<()> {
	let file_layer = match log_file {
		Some(path) => {
			if let Some(parent) = path.parent() {
				fs::create_dir_all(parent)
					.with_context(|| format!("failed to create log directory '{}'", parent.display()))?;
			}
			let file = File::create(path)
				.with_context(|| format!("failed to create log file '{}'", path.display()))?;
			Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
		}
		None => None,
	};

	let subscriber = tracing_subscriber::registry()
		.with(build_filter(level))
		.with(fmt::layer())
		.with(file_layer);

	if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
		eprintln!("Failed to set global default subscriber: {}", err);
	}
	Ok(())
}
