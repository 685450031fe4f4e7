use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::transport::RequestOutcome;

/// Aggregate statistics for a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
	pub total_domains: usize,
	/// Distinct domains that were requested at least once, in configured order
	pub domains_used: Vec<String>,
	pub total_requests: usize,
	pub total_errors: usize,
	pub error_percentage: f64,
	pub average_s: f64,
	pub max_s: f64,
	pub p90_s: f64,
	pub total_test_time: Duration,
}

/// Lock-guarded append log shared by all workers.
#[derive(Debug, Default)]
pub struct ResultCollector {
	outcomes: Mutex<Vec<RequestOutcome>>,
}

impl ResultCollector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append one outcome. The lock is held only for the push.
	pub fn record(&self, outcome: RequestOutcome) {
		// Outcomes are plain data, a panic elsewhere cannot leave them half-written
		self.outcomes.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push(outcome);
	}

	/// Take the collected outcomes once every worker has joined.
	pub fn drain(&self) -> Vec<RequestOutcome> {
		std::mem::take(&mut *self.outcomes.lock().unwrap_or_else(PoisonError::into_inner))
	}
}

/// Calculate the p-th percentile from a sorted slice using nearest-rank method.
///
/// Args:
///   sorted_values: Pre-sorted slice of f64 values.
///   p: Percentile between 0.0 and 100.0 (e.g. 90.0).
///
/// Returns:
///   None if the slice is empty, otherwise the percentile value.
pub fn percentile(sorted_values: &[f64], p: f64) -> Option<f64> {
	if sorted_values.is_empty() {
		return None;
	}
	// Nearest-rank: rank = ceil(p/100 * N), clamped to [1, N]
	let n = sorted_values.len();
	let rank = ((p / 100.0) * n as f64).ceil() as usize;
	let rank = rank.clamp(1, n);
	Some(sorted_values[rank - 1])
}

/// Calculate the arithmetic mean of a slice of values.
pub fn mean(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}
	let sum: f64 = values.iter().sum();
	Some(sum / values.len() as f64)
}

/// Reduce a finished run to its summary.
///
/// Latency figures cover every attempt, failed ones included, so a timeout
/// shows up in the average and tail instead of vanishing.
pub fn summarize(
	domains: &[String],
	outcomes: &[RequestOutcome],
	total_test_time: Duration,
) -> Summary {
	let total_requests = outcomes.len();
	let total_errors = outcomes.iter().filter(|o| !o.is_success()).count();
	let error_percentage = if total_requests > 0 {
		(total_errors as f64 / total_requests as f64) * 100.0
	} else {
		0.0
	};

	let mut elapsed: Vec<f64> = outcomes.iter()
		.map(|o| o.elapsed.as_secs_f64())
		.collect();
	elapsed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

	let requested: HashSet<&str> = outcomes.iter().map(|o| o.domain.as_str()).collect();
	let mut seen: HashSet<&str> = HashSet::new();
	let domains_used: Vec<String> = domains.iter()
		.filter(|d| requested.contains(d.as_str()) && seen.insert(d.as_str()))
		.cloned()
		.collect();

	Summary {
		total_domains: domains.len(),
		domains_used,
		total_requests,
		total_errors,
		error_percentage,
		average_s: mean(&elapsed).unwrap_or(0.0),
		max_s: elapsed.last().copied().unwrap_or(0.0),
		p90_s: percentile(&elapsed, 90.0).unwrap_or(0.0),
		total_test_time,
	}
}
