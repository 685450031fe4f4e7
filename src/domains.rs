use serde::Deserialize;
use tracing::info;

use crate::error::ConfigError;

/// Shape of the domain list file
#[derive(Debug, Deserialize)]
struct DomainFile {
	domains: Option<Vec<String>>,
}

/// Parse a YAML document with a top-level `domains` sequence.
///
/// Entries are passed through as-is; malformed hosts are left to fail at
/// request time. `source` names the document in error messages.
pub fn parse_domains(content: &str, source: &str) -> Result<Vec<String>, ConfigError> {
	let file: DomainFile = serde_yaml::from_str(content)
		.map_err(|e| ConfigError::ParseYaml { path: source.to_string(), source: e })?;
	let domains = file.domains
		.ok_or_else(|| ConfigError::MissingDomains(source.to_string()))?;
	if domains.is_empty() {
		return Err(ConfigError::EmptyDomains);
	}
	Ok(domains)
}

/// Read domains from a YAML file.
pub fn read_domain_file(path: &str) -> Result<Vec<String>, ConfigError> {
	info!("Loading domains from YAML file: {}", path);
	let content = std::fs::read_to_string(path)
		.map_err(|e| ConfigError::ReadFile { path: path.to_string(), source: e })?;
	let domains = parse_domains(&content, path)?;
	info!("Loaded {} domains from YAML file", domains.len());
	Ok(domains)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_domains() {
		let yaml = "domains:\n  - example.com\n  - error.com\n  - ///fkbjmfd\n";
		let domains = parse_domains(yaml, "test").unwrap();
		assert_eq!(domains, vec!["example.com", "error.com", "///fkbjmfd"]);
	}

	#[test]
	fn test_parse_domains_ignores_other_keys() {
		let yaml = "owner: ops\ndomains: [a.com, b.com]\n";
		assert_eq!(parse_domains(yaml, "test").unwrap().len(), 2);
	}

	#[test]
	fn test_missing_domains_key() {
		let err = parse_domains("hosts:\n  - a.com\n", "test").unwrap_err();
		assert!(matches!(err, ConfigError::MissingDomains(_)));
	}

	#[test]
	fn test_empty_domains() {
		let err = parse_domains("domains: []\n", "test").unwrap_err();
		assert!(matches!(err, ConfigError::EmptyDomains));
	}

	#[test]
	fn test_domains_not_a_sequence() {
		let err = parse_domains("domains: example.com\n", "test").unwrap_err();
		assert!(matches!(err, ConfigError::ParseYaml { .. }));
	}

	#[test]
	fn test_malformed_yaml() {
		let err = parse_domains("domains: [a.com\n", "test").unwrap_err();
		assert!(matches!(err, ConfigError::ParseYaml { .. }));
	}

	#[test]
	fn test_read_domain_file() {
		let path = std::env::temp_dir()
			.join(format!("domain-stress-{}.yaml", std::process::id()));
		std::fs::write(&path, "domains:\n  - example.com\n").unwrap();
		let domains = read_domain_file(path.to_str().unwrap()).unwrap();
		std::fs::remove_file(&path).unwrap();
		assert_eq!(domains, vec!["example.com"]);
	}

	#[test]
	fn test_read_missing_file() {
		let err = read_domain_file("/nonexistent/domains.yaml").unwrap_err();
		assert!(matches!(err, ConfigError::ReadFile { .. }));
	}
}
