use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

use crate::error::ConfigError;

/// Placeholder substituted with the domain when building request URLs.
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Upper bound on concurrent workers
pub const MAX_WORKERS: usize = 10_000;

/// How budget slots are mapped onto domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DomainSelection {
	/// Uniform random choice per request
	Random,
	/// Cycle through the list in file order
	RoundRobin,
}

/// Which outcomes count as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusPolicy {
	/// Only transport faults and timeouts are errors; any HTTP status is a success
	Transport,
	/// Non-2xx statuses are errors as well
	Strict,
}

/// Per-attempt failure classification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
	#[error("timeout: {0}")]
	Timeout(String),
	#[error("connect: {0}")]
	Connect(String),
	#[error("invalid url: {0}")]
	InvalidUrl(String),
	#[error("status: HTTP {0}")]
	Status(u16),
	#[error("transport: {0}")]
	Transport(String),
}

/// Result of a single request attempt
#[derive(Debug, Clone)]
pub struct RequestOutcome {
	pub worker: usize,
	pub domain: String,
	pub elapsed: Duration,
	pub status: Option<u16>,
	pub error: Option<RequestError>,
}

impl RequestOutcome {
	pub fn is_success(&self) -> bool {
		self.error.is_none()
	}
}

/// Stress run configuration
#[derive(Debug, Clone)]
pub struct StressConfig {
	pub workers: usize,
	pub total_requests: usize,
	pub timeout: Duration,
	pub selection: DomainSelection,
	pub seed: Option<u64>,
	pub status_policy: StatusPolicy,
	pub url_template: String,
	pub headers: Vec<(String, String)>,
}

impl Default for StressConfig {
	fn default() -> Self {
		Self {
			workers: 10,
			total_requests: 100,
			timeout: Duration::from_secs(60),
			selection: DomainSelection::Random,
			seed: None,
			status_policy: StatusPolicy::Transport,
			url_template: format!("https://{}", DOMAIN_PLACEHOLDER),
			headers: Vec::new(),
		}
	}
}

impl StressConfig {
	/// Reject settings that would make the run meaningless.
	///
	/// `total_requests == 0` is allowed and yields an empty run.
	pub fn validate(&self, domains: &[String]) -> Result<(), ConfigError> {
		if domains.is_empty() {
			return Err(ConfigError::EmptyDomains);
		}
		if self.workers == 0 {
			return Err(ConfigError::ZeroWorkers);
		}
		if self.workers > MAX_WORKERS {
			return Err(ConfigError::TooManyWorkers(MAX_WORKERS));
		}
		if self.timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		if !self.url_template.contains(DOMAIN_PLACEHOLDER) {
			return Err(ConfigError::InvalidUrlTemplate(self.url_template.clone()));
		}
		Ok(())
	}
}
