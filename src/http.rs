use std::error::Error as _;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::error::ConfigError;
use crate::transport::{RequestError, StatusPolicy, DOMAIN_PLACEHOLDER};

/// Timing and classification of a single GET
#[derive(Debug)]
pub struct Exchange {
	pub elapsed: Duration,
	pub status: Option<u16>,
	pub error: Option<RequestError>,
}

/// Parse a `Name: value` header argument.
pub fn parse_header(input: &str) -> Result<(String, String), ConfigError> {
	let (name, value) = input.split_once(':')
		.ok_or_else(|| ConfigError::InvalidHeader(input.to_string()))?;
	let name = name.trim();
	if name.is_empty() {
		return Err(ConfigError::InvalidHeader(input.to_string()));
	}
	Ok((name.to_string(), value.trim().to_string()))
}

/// Build the shared HTTP client.
///
/// The timeout covers the whole exchange (connect, TLS, headers and body),
/// so a stalled server surfaces as a timeout error rather than hanging a worker.
pub fn build_client(
	timeout: Duration,
	headers: &[(String, String)],
) -> Result<Client, ConfigError> {
	let mut header_map = HeaderMap::new();
	for (name, value) in headers {
		let raw = format!("{}: {}", name, value);
		let name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|_| ConfigError::InvalidHeader(raw.clone()))?;
		let value = HeaderValue::from_str(value)
			.map_err(|_| ConfigError::InvalidHeader(raw))?;
		header_map.insert(name, value);
	}

	Client::builder()
		.timeout(timeout)
		.default_headers(header_map)
		.build()
		.map_err(ConfigError::HttpClient)
}

/// Build the request URL for a domain.
///
/// Domains that already carry an http(s) scheme are used verbatim.
pub fn build_url(template: &str, domain: &str) -> String {
	if domain.starts_with("http://") || domain.starts_with("https://") {
		return domain.to_string();
	}
	template.replace(DOMAIN_PLACEHOLDER, domain)
}

/// Map a reqwest failure onto the request error taxonomy.
pub fn classify_error(err: &reqwest::Error) -> RequestError {
	let detail = error_chain(err);
	if err.is_timeout() {
		RequestError::Timeout(detail)
	} else if err.is_builder() {
		RequestError::InvalidUrl(detail)
	} else if err.is_connect() {
		RequestError::Connect(detail)
	} else {
		RequestError::Transport(detail)
	}
}

// reqwest's Display omits the underlying cause (DNS, refused, TLS)
fn error_chain(err: &reqwest::Error) -> String {
	let mut detail = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		detail.push_str(": ");
		detail.push_str(&cause.to_string());
		source = cause.source();
	}
	detail
}

/// Perform one GET and measure it, never failing.
///
/// Timing starts just before the request is sent and stops once the body
/// has been read or the error surfaced.
pub async fn send_request(client: &Client, url: &str, policy: StatusPolicy) -> Exchange {
	let start = Instant::now();
	let response = match client.get(url).send().await {
		Ok(response) => response,
		Err(e) => {
			return Exchange {
				elapsed: start.elapsed(),
				status: None,
				error: Some(classify_error(&e)),
			};
		}
	};

	let status = response.status();
	let body = response.bytes().await;
	let elapsed = start.elapsed();

	let error = match body {
		Err(e) => Some(classify_error(&e)),
		Ok(bytes) => {
			debug!(url, status = status.as_u16(), bytes = bytes.len(), "response body read");
			match policy {
				StatusPolicy::Strict if !status.is_success() => {
					Some(RequestError::Status(status.as_u16()))
				}
				_ => None,
			}
		}
	};

	Exchange {
		elapsed,
		status: Some(status.as_u16()),
		error,
	}
}


#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_header() {
		let (name, value) = parse_header("Authorization: Token abc:def").unwrap();
		assert_eq!(name, "Authorization");
		assert_eq!(value, "Token abc:def");
	}

	#[test]
	fn test_parse_header_rejects_missing_colon() {
		assert!(matches!(parse_header("Authorization"), Err(ConfigError::InvalidHeader(_))));
		assert!(matches!(parse_header(": value"), Err(ConfigError::InvalidHeader(_))));
	}

	#[test]
	fn test_build_client_rejects_bad_header_name() {
		let headers = vec![("bad name".to_string(), "v".to_string())];
		let err = build_client(Duration::from_secs(1), &headers).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidHeader(_)));
	}

	#[test]
	fn test_build_url() {
		assert_eq!(build_url("https://{domain}", "example.com"), "https://example.com");
		assert_eq!(
			build_url("https://api.test/ranking/{domain}", "example.com"),
			"https://api.test/ranking/example.com",
		);
		assert_eq!(build_url("https://{domain}", "http://127.0.0.1:80/x"), "http://127.0.0.1:80/x");
		// Malformed entries pass through untouched
		assert_eq!(build_url("https://{domain}", "///fkbjmfd"), "https://///fkbjmfd");
	}

	#[tokio::test]
	async fn test_send_request_success() {
		let addr = test_server::spawn(200).await;
		let client = build_client(Duration::from_secs(5), &[]).unwrap();
		let exchange = send_request(&client, &format!("http://{}/", addr), StatusPolicy::Transport).await;
		assert!(exchange.error.is_none());
		assert_eq!(exchange.status, Some(200));
	}

	#[tokio::test]
	async fn test_status_policy() {
		let addr = test_server::spawn(503).await;
		let client = build_client(Duration::from_secs(5), &[]).unwrap();
		let url = format!("http://{}/", addr);

		let lenient = send_request(&client, &url, StatusPolicy::Transport).await;
		assert!(lenient.error.is_none());
		assert_eq!(lenient.status, Some(503));

		let strict = send_request(&client, &url, StatusPolicy::Strict).await;
		assert_eq!(strict.error, Some(RequestError::Status(503)));
		assert_eq!(strict.status, Some(503));
	}

	#[tokio::test]
	async fn test_connection_refused_is_error() {
		let addr = test_server::closed_port().await;
		let client = build_client(Duration::from_secs(5), &[]).unwrap();
		let exchange = send_request(&client, &format!("http://{}/", addr), StatusPolicy::Transport).await;
		assert!(exchange.error.is_some());
		assert_eq!(exchange.status, None);
	}

	#[tokio::test]
	async fn test_stalled_server_times_out() {
		let addr = test_server::stall().await;
		let client = build_client(Duration::from_secs(1), &[]).unwrap();
		let exchange = send_request(&client, &format!("http://{}/", addr), StatusPolicy::Transport).await;
		assert!(matches!(exchange.error, Some(RequestError::Timeout(_))));
		assert!(exchange.elapsed >= Duration::from_secs(1));
		assert_eq!(exchange.status, None);
	}

	#[tokio::test]
	async fn test_unparsable_url_is_error() {
		let client = build_client(Duration::from_secs(1), &[]).unwrap();
		let exchange = send_request(&client, "http://exa mple.com/", StatusPolicy::Transport).await;
		assert!(matches!(exchange.error, Some(RequestError::InvalidUrl(_))));
	}
}
