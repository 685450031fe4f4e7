use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ConfigError;
use crate::http::{build_client, build_url, send_request};
use crate::stats::ResultCollector;
use crate::transport::{DomainSelection, RequestOutcome, StressConfig};

/// Shared countdown of request slots.
///
/// Each slot is handed out exactly once, so workers together never issue
/// more than `total` requests.
#[derive(Debug)]
pub struct RequestBudget {
	next: AtomicUsize,
	total: usize,
	closed: AtomicBool,
}

impl RequestBudget {
	pub fn new(total: usize) -> Self {
		Self {
			next: AtomicUsize::new(0),
			total,
			closed: AtomicBool::new(false),
		}
	}

	/// Claim the next slot, or None once the budget is spent or closed.
	pub fn claim(&self) -> Option<usize> {
		if self.closed.load(Ordering::Acquire) {
			return None;
		}
		let slot = self.next.fetch_add(1, Ordering::AcqRel);
		(slot < self.total).then_some(slot)
	}

	/// Stop handing out slots; requests already in flight are unaffected.
	pub fn close(&self) {
		self.closed.store(true, Ordering::Release);
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}
}

/// Everything a finished (or interrupted) run produced
#[derive(Debug)]
pub struct RunReport {
	pub outcomes: Vec<RequestOutcome>,
	pub total_test_time: Duration,
	pub interrupted: bool,
}

/// Map a budget slot onto a domain index.
///
/// Random picks are drawn from an RNG seeded by `base_seed ^ slot`, so a
/// fixed seed yields the same domain per slot regardless of how workers
/// interleave, without allocating anything per request up front.
pub fn pick_domain(
	slot: usize,
	domain_count: usize,
	selection: DomainSelection,
	base_seed: u64,
) -> usize {
	match selection {
		DomainSelection::RoundRobin => slot % domain_count,
		DomainSelection::Random => {
			StdRng::seed_from_u64(base_seed ^ slot as u64).gen_range(0..domain_count)
		}
	}
}

/// State handed to each worker at spawn time
struct WorkerContext {
	id: usize,
	client: Client,
	domains: Arc<[String]>,
	base_seed: u64,
	budget: Arc<RequestBudget>,
	collector: Arc<ResultCollector>,
	config: Arc<StressConfig>,
}

/// Worker loop: claim a slot, request, record, repeat.
async fn run_worker(ctx: WorkerContext) {
	debug!(worker = ctx.id, "worker starting");
	let mut handled = 0usize;

	while let Some(slot) = ctx.budget.claim() {
		let index = pick_domain(slot, ctx.domains.len(), ctx.config.selection, ctx.base_seed);
		let domain = &ctx.domains[index];
		let url = build_url(&ctx.config.url_template, domain);
		debug!(worker = ctx.id, slot, %url, "querying domain");

		let exchange = send_request(&ctx.client, &url, ctx.config.status_policy).await;
		match &exchange.error {
			None => debug!(
				worker = ctx.id, domain = %domain, status = ?exchange.status,
				elapsed_s = exchange.elapsed.as_secs_f64(), "request succeeded",
			),
			Some(e) => warn!(worker = ctx.id, %url, error = %e, "request failed"),
		}

		ctx.collector.record(RequestOutcome {
			worker: ctx.id,
			domain: domain.clone(),
			elapsed: exchange.elapsed,
			status: exchange.status,
			error: exchange.error,
		});
		handled += 1;
	}

	debug!(worker = ctx.id, handled, "worker finished");
}

/// Run the stress test until the budget is exhausted.
///
/// Spawns exactly `config.workers` workers and waits for all of them.
/// Setting `cancel` to `true` closes the budget: no new requests are
/// issued, in-flight ones complete, and the report covers what was collected.
pub async fn run_stress_test(
	domains: &[String],
	config: &StressConfig,
	mut cancel: watch::Receiver<bool>,
) -> Result<RunReport, ConfigError> {
	config.validate(domains)?;
	let client = build_client(config.timeout, &config.headers)?;

	let base_seed = config.seed.unwrap_or_else(rand::random);
	let domains: Arc<[String]> = domains.to_vec().into();
	let budget = Arc::new(RequestBudget::new(config.total_requests));
	let collector = Arc::new(ResultCollector::new());
	let config = Arc::new(config.clone());

	info!(
		workers = config.workers,
		total_requests = config.total_requests,
		domains = domains.len(),
		"dispatching requests",
	);
	let start = Instant::now();

	// Close the budget on cancellation while the workers drain
	let watcher = {
		let budget = budget.clone();
		tokio::spawn(async move {
			loop {
				if *cancel.borrow_and_update() {
					warn!("interrupt received, no new requests will be issued");
					budget.close();
					break;
				}
				if cancel.changed().await.is_err() {
					break;
				}
			}
		})
	};

	let mut handles = Vec::new();
	for id in 1..=config.workers {
		let ctx = WorkerContext {
			id,
			client: client.clone(),
			domains: domains.clone(),
			base_seed,
			budget: budget.clone(),
			collector: collector.clone(),
			config: config.clone(),
		};
		handles.push(tokio::spawn(run_worker(ctx)));
	}

	for handle in handles {
		if let Err(e) = handle.await {
			error!("worker task failed: {}", e);
		}
	}
	let total_test_time = start.elapsed();
	watcher.abort();

	let interrupted = budget.is_closed();
	let outcomes = collector.drain();

	info!(
		recorded = outcomes.len(),
		elapsed_s = total_test_time.as_secs_f64(),
		interrupted,
		"all workers finished",
	);

	Ok(RunReport {
		outcomes,
		total_test_time,
		interrupted,
	})
}
