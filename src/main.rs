mod bench;
mod cli;
mod domains;
mod error;
mod http;
mod logging;
mod output;
mod stats;
mod transport;

use clap::Parser;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::transport::StressConfig;

/// What a Ctrl-C does at a given point in the run
#[derive(Debug, PartialEq, Eq)]
enum InterruptAction {
	/// Stop new requests, let in-flight ones finish, still summarize
	Drain,
	/// Exit immediately without waiting for in-flight timeouts
	Exit,
}

fn interrupt_action(count: u32) -> InterruptAction {
	if count <= 1 {
		InterruptAction::Drain
	} else {
		InterruptAction::Exit
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	// One timestamp names both the log file and the default summary CSV
	let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
	let log_file = (!cli.no_log_file).then(|| logging::log_file_path(&cli.log_dir, &timestamp));
	logging::init_logging(cli.log_level, log_file.as_deref())?;
	if let Some(path) = &log_file {
		info!("Logging to {}", path.display());
	}

	let domains = domains::read_domain_file(&cli.yaml_file)?;

	let headers = cli.headers.iter()
		.map(|h| http::parse_header(h))
		.collect::<Result<Vec<_>, _>>()?;
	let config = StressConfig {
		workers: cli.threads as usize,
		total_requests: cli.total_requests as usize,
		timeout: Duration::from_secs(cli.timeout),
		selection: cli.distribution,
		seed: cli.seed,
		status_policy: cli.status_policy,
		url_template: cli.url_template.clone(),
		headers,
	};

	output::print_config_summary(domains.len(), &config);

	let (cancel_tx, cancel_rx) = watch::channel(false);
	tokio::spawn(async move {
		let mut interrupts = 0u32;
		while tokio::signal::ctrl_c().await.is_ok() {
			interrupts += 1;
			match interrupt_action(interrupts) {
				InterruptAction::Drain => {
					drop(cancel_tx.send(true));
					eprintln!("Stopping after in-flight requests; press Ctrl-C again to exit now");
				}
				InterruptAction::Exit => {
					warn!("Second interrupt, exiting without a summary");
					std::process::exit(130);
				}
			}
		}
	});

	println!("Running stress test...");
	let report = bench::run_stress_test(&domains, &config, cancel_rx).await?;
	if report.interrupted {
		warn!("Test stopped by user after {} requests", report.outcomes.len());
	}

	let summary = stats::summarize(&domains, &report.outcomes, report.total_test_time);
	info!(
		"Test completed: total time {:.2} s, requests {}, error rate {:.2}%, average {:.6} s, max {:.6} s, p90 {:.6} s",
		summary.total_test_time.as_secs_f64(),
		summary.total_requests,
		summary.error_percentage,
		summary.average_s,
		summary.max_s,
		summary.p90_s,
	);

	output::print_summary_table(&summary, report.interrupted);

	let output_path = cli.output.clone()
		.unwrap_or_else(|| output::default_output_path(&timestamp));
	output::write_summary_csv(&output_path, &summary)?;

	if let Some(path) = &cli.requests_csv {
		output::write_requests_csv(path, &report.outcomes)?;
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_first_interrupt_drains_second_exits() {
		assert_eq!(interrupt_action(1), InterruptAction::Drain);
		assert_eq!(interrupt_action(2), InterruptAction::Exit);
		assert_eq!(interrupt_action(3), InterruptAction::Exit);
	}
}
