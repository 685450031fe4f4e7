use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL};

use crate::stats::Summary;
use crate::transport::{RequestOutcome, StressConfig};

/// Default summary CSV path, e.g. `results/results_20260416_101500.csv`.
pub fn default_output_path(timestamp: &str) -> String {
	format!("results/results_{}.csv", timestamp)
}

/// Print a summary of the run configuration before dispatching.
pub fn print_config_summary(domain_count: usize, config: &StressConfig) {
	println!("HTTP Stress Test Configuration");
	println!("==============================");
	println!("Domains:        {}", domain_count);
	println!("Workers:        {}", config.workers);
	println!("Requests:       {}", config.total_requests);
	println!("Timeout:        {} s", config.timeout.as_secs());
	println!("Distribution:   {:?}", config.selection);
	println!("Status policy:  {:?}", config.status_policy);
	println!("URL template:   {}", config.url_template);
	if let Some(seed) = config.seed {
		println!("Seed:           {}", seed);
	}
	println!();
}

/// Labelled, formatted summary fields shared by the table and the CSV.
pub fn summary_rows(summary: &Summary) -> Vec<(&'static str, String)> {
	vec![
		("Total domains configured", summary.total_domains.to_string()),
		("Total domains used", summary.domains_used.len().to_string()),
		("All domains that were used", format!("[{}]", summary.domains_used.join(", "))),
		("Total Requests Made", summary.total_requests.to_string()),
		("Total Errors", summary.total_errors.to_string()),
		("Error percentage", format!("{:.2}%", summary.error_percentage)),
		("Average Response Time (s)", format!("{:.6}", summary.average_s)),
		("Max Response Time (s)", format!("{:.6}", summary.max_s)),
		("90th Percentile Response Time (s)", format!("{:.6}", summary.p90_s)),
		("Total Test Time (s)", format!("{:.2}", summary.total_test_time.as_secs_f64())),
	]
}

/// Print the run summary as a formatted table.
pub fn print_summary_table(summary: &Summary, interrupted: bool) {
	let mut table = Table::new();
	table.load_preset(UTF8_FULL);
	table.set_content_arrangement(ContentArrangement::Dynamic);
	table.set_header(vec!["Metric", "Value"]);
	for (label, value) in summary_rows(summary) {
		table.add_row(vec![label.to_string(), value]);
	}

	println!("\nStress Test Summary");
	println!("===================\n");
	if interrupted {
		println!("(interrupted: summary covers completed requests only)\n");
	}
	println!("{table}");
}

fn ensure_parent(path: &str) -> Result<()> {
	if let Some(parent) = Path::new(path).parent() {
		if !parent.as_os_str().is_empty() {
			fs::create_dir_all(parent)
				.with_context(|| format!("failed to create directory '{}'", parent.display()))?;
		}
	}
	Ok(())
}

/// Write the run summary to a CSV file as label/value rows.
pub fn write_summary_csv(path: &str, summary: &Summary) -> Result<()> {
	ensure_parent(path)?;
	let mut writer = csv::WriterBuilder::new()
		.flexible(true)
		.from_path(path)
		.with_context(|| format!("failed to create summary CSV '{}'", path))?;

	writer.write_record(["Summary"])?;
	for (label, value) in summary_rows(summary) {
		writer.write_record([label, value.as_str()])?;
	}
	writer.write_record(["~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~"])?;

	writer.flush()?;
	println!("\nSummary written to: {}", path);
	Ok(())
}

/// Write one CSV row per request attempt.
pub fn write_requests_csv(path: &str, outcomes: &[RequestOutcome]) -> Result<()> {
	ensure_parent(path)?;
	let mut writer = csv::Writer::from_path(path)
		.with_context(|| format!("failed to create requests CSV '{}'", path))?;

	writer.write_record(["worker", "domain", "elapsed_s", "status", "error"])?;
	for o in outcomes {
		writer.write_record([
			o.worker.to_string(),
			o.domain.clone(),
			format!("{:.6}", o.elapsed.as_secs_f64()),
			o.status.map(|s| s.to_string()).unwrap_or_default(),
			o.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
		])?;
	}

	writer.flush()?;
	println!("Per-request results written to: {}", path);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;
	use crate::transport::RequestError;

	fn summary() -> Summary {
		Summary {
			total_domains: 3,
			domains_used: vec!["example.com".to_string(), "error.com".to_string()],
			total_requests: 10,
			total_errors: 3,
			error_percentage: 30.0,
			average_s: 0.1234567,
			max_s: 1.5,
			p90_s: 0.9,
			total_test_time: Duration::from_millis(4321),
		}
	}

	fn temp_path(name: &str) -> String {
		std::env::temp_dir()
			.join(format!("domain-stress-{}-{}", std::process::id(), name))
			.to_string_lossy()
			.into_owned()
	}

	#[test]
	fn test_summary_rows_formatting() {
		let rows = summary_rows(&summary());
		let get = |label: &str| rows.iter().find(|(l, _)| *l == label).unwrap().1.clone();
		assert_eq!(get("Total Requests Made"), "10");
		assert_eq!(get("Error percentage"), "30.00%");
		assert_eq!(get("Average Response Time (s)"), "0.123457");
		assert_eq!(get("Max Response Time (s)"), "1.500000");
		assert_eq!(get("90th Percentile Response Time (s)"), "0.900000");
		assert_eq!(get("Total Test Time (s)"), "4.32");
		assert_eq!(get("Total domains configured"), "3");
		assert_eq!(get("Total domains used"), "2");
		assert_eq!(get("All domains that were used"), "[example.com, error.com]");
	}

	#[test]
	fn test_default_output_path() {
		assert_eq!(default_output_path("20260101_000000"), "results/results_20260101_000000.csv");
	}

	#[test]
	fn test_write_summary_csv() {
		let path = temp_path("summary.csv");
		write_summary_csv(&path, &summary()).unwrap();
		let content = fs::read_to_string(&path).unwrap();
		fs::remove_file(&path).unwrap();

		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines[0], "Summary");
		assert!(lines.contains(&"Total Requests Made,10"));
		assert!(lines.contains(&"Error percentage,30.00%"));
		assert!(lines.last().unwrap().starts_with("~~~~"));
	}

	#[test]
	fn test_write_requests_csv() {
		let path = temp_path("requests.csv");
		let outcomes = vec![
			RequestOutcome {
				worker: 1,
				domain: "example.com".to_string(),
				elapsed: Duration::from_millis(250),
				status: Some(200),
				error: None,
			},
			RequestOutcome {
				worker: 2,
				domain: "///fkbjmfd".to_string(),
				elapsed: Duration::from_millis(10),
				status: None,
				error: Some(RequestError::Connect("dns error".to_string())),
			},
		];
		write_requests_csv(&path, &outcomes).unwrap();
		let content = fs::read_to_string(&path).unwrap();
		fs::remove_file(&path).unwrap();

		let lines: Vec<&str> = content.lines().collect();
		assert_eq!(lines.len(), 3);
		assert_eq!(lines[1], "1,example.com,0.250000,200,");
		assert_eq!(lines[2], "2,///fkbjmfd,0.010000,,connect: dns error");
	}
}
