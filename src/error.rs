use thiserror::Error;

/// Fatal problems detected before any request is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read domain file '{path}': {source}")]
	ReadFile {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse domain file '{path}': {source}")]
	ParseYaml {
		path: String,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("domain file '{0}' has no top-level 'domains' sequence")]
	MissingDomains(String),

	#[error("domain list is empty")]
	EmptyDomains,

	#[error("worker count must be at least 1")]
	ZeroWorkers,

	#[error("worker count must be at most {0}")]
	TooManyWorkers(usize),

	#[error("request timeout must be greater than zero")]
	ZeroTimeout,

	#[error("url template '{0}' must contain a {{domain}} placeholder")]
	InvalidUrlTemplate(String),

	#[error("invalid header '{0}', expected 'Name: value'")]
	InvalidHeader(String),

	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[source] reqwest::Error),
}
