use clap::{Parser, ValueEnum};

use crate::transport::{DomainSelection, StatusPolicy, MAX_WORKERS};

/// Diagnostic log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
	Debug,
	Info,
	Warning,
	Error,
	Critical,
}

/// HTTP stress test across a list of domains
#[derive(Parser, Debug)]
#[command(name = "domain-stress")]
#[command(about = "Fan out concurrent HTTP requests across a YAML domain list and report latency")]
pub struct Cli {
	/// Path to YAML file containing a top-level `domains` list
	#[arg(long = "yaml-file")]
	pub yaml_file: String,

	/// Number of concurrent workers
	#[arg(long = "threads", default_value = "10",
		value_parser = clap::value_parser!(u64).range(1..=MAX_WORKERS as u64))]
	pub threads: u64,

	/// Per-request timeout in seconds
	#[arg(long = "timeout", default_value = "60",
		value_parser = clap::value_parser!(u64).range(1..))]
	pub timeout: u64,

	/// Total number of requests to distribute across workers
	#[arg(long = "total-requests", default_value = "100",
		value_parser = clap::value_parser!(u64).range(1..))]
	pub total_requests: u64,

	/// Logging level
	#[arg(long = "log-level", value_enum, ignore_case = true, default_value = "info")]
	pub log_level: LogLevel,

	/// How requests are distributed across domains
	#[arg(long = "distribution", value_enum, default_value = "random")]
	pub distribution: DomainSelection,

	/// Random seed for a reproducible domain order
	#[arg(short = 's', long = "seed")]
	pub seed: Option<u64>,

	/// Which outcomes count as errors
	#[arg(long = "status-policy", value_enum, default_value = "transport")]
	pub status_policy: StatusPolicy,

	/// Request URL; {domain} is replaced with each domain. Use "http://{domain}" for plain http
	#[arg(long = "url-template", default_value = "https://{domain}")]
	pub url_template: String,

	/// Extra request header (repeatable, e.g. "Authorization: Token abc")
	#[arg(short = 'H', long = "header")]
	pub headers: Vec<String>,

	/// Summary CSV path [default: results/results_<timestamp>.csv]
	#[arg(short = 'o', long = "output")]
	pub output: Option<String>,

	/// Also write one CSV row per request to this path
	#[arg(long = "requests-csv")]
	pub requests_csv: Option<String>,

	/// Directory for the run log file
	#[arg(long = "log-dir", default_value = "logs")]
	pub log_dir: String,

	/// Log to the console only
	#[arg(long = "no-log-file")]
	pub no_log_file: bool,
}
