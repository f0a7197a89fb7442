//! A small HTTP load generator

use anyhow::Result;
use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use std::{
	sync::Arc,
	time::{Duration, Instant},
};
use thiserror::Error;
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, trace};
use url::Url;

use crate::status;

#[derive(Debug, Error)]
pub enum BenchError {
	#[error("concurrency must be at least 1")]
	ZeroConcurrency,

	#[error("could not build http client")]
	Client(#[from] reqwest::Error),

	#[error("request pool closed")]
	PoolClosed(#[from] tokio::sync::AcquireError),

	#[error("request task failed")]
	Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct BenchOptions {
	pub endpoint: Url,
	pub requests: usize,

	/// How many requests may be in flight at once
	pub concurrency: usize,

	/// The size of each request's message, in bytes
	pub payload_size: usize,

	/// Per-request timeout
	pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
	pub min: Duration,
	pub mean: Duration,
	pub p50: Duration,
	pub p95: Duration,
	pub max: Duration,
}

impl LatencyStats {
	/// Summarize latency samples.
	/// Returns `None` if there are none.
	pub fn from_samples(mut samples: Vec<Duration>) -> Option<Self> {
		if samples.is_empty() {
			return None;
		}
		samples.sort_unstable();

		let total: Duration = samples.iter().sum();
		return Some(Self {
			min: samples[0],
			mean: total / u32::try_from(samples.len()).unwrap_or(u32::MAX),
			p50: percentile(&samples, 50),
			p95: percentile(&samples, 95),
			max: samples[samples.len() - 1],
		});
	}
}

/// Nearest-rank percentile of sorted, non-empty samples
fn percentile(sorted: &[Duration], p: usize) -> Duration {
	let rank = (p * sorted.len()).div_ceil(100);
	sorted[rank.clamp(1, sorted.len()) - 1]
}

#[derive(Debug)]
pub struct BenchReport {
	pub total: usize,
	pub succeeded: usize,
	pub failed: usize,
	pub elapsed: Duration,
	pub latency: Option<LatencyStats>,
}

impl BenchReport {
	pub fn requests_per_second(&self) -> f64 {
		let secs = self.elapsed.as_secs_f64();
		if secs == 0.0 {
			return 0.0;
		}
		self.total as f64 / secs
	}
}

/// The body of request `seq`
pub fn payload(size: usize, seq: usize) -> Value {
	json!({
		"message": "x".repeat(size),
		"seq": seq,
	})
}

/// Results of finished requests
#[derive(Debug, Default)]
struct Tally {
	samples: Vec<Duration>,
	failed: usize,
}

impl Tally {
	fn record(&mut self, result: Result<Duration, reqwest::Error>, progress: &ProgressBar) {
		match result {
			Ok(d) => {
				trace!(message = "Request finished", latency = ?d);
				self.samples.push(d);
			}
			Err(error) => {
				debug!(message = "Request failed", %error);
				self.failed += 1;
			}
		}
		progress.inc(1);
	}
}

/// Send `options.requests` requests, at most `options.concurrency` at a time.
/// Failed requests are counted, they never stop the run.
pub async fn bench(options: &BenchOptions, progress: &ProgressBar) -> Result<BenchReport, BenchError> {
	if options.concurrency == 0 {
		return Err(BenchError::ZeroConcurrency);
	}

	let client = reqwest::Client::builder().timeout(options.timeout).build()?;
	let pool = Arc::new(Semaphore::new(options.concurrency));
	let mut tasks = JoinSet::new();
	let mut tally = Tally::default();
	let start = Instant::now();

	for seq in 0..options.requests {
		let permit = pool.clone().acquire_owned().await?;
		let client = client.clone();
		let url = options.endpoint.clone();
		let body = payload(options.payload_size, seq);

		tasks.spawn(async move {
			let sent = Instant::now();
			let res = client
				.post(url)
				.json(&body)
				.send()
				.await
				.and_then(|r| r.error_for_status());
			drop(permit);
			res.map(|_| sent.elapsed())
		});

		while let Some(done) = tasks.try_join_next() {
			tally.record(done?, progress);
		}
	}

	while let Some(done) = tasks.join_next().await {
		tally.record(done?, progress);
	}

	let elapsed = start.elapsed();
	progress.finish_and_clear();

	return Ok(BenchReport {
		total: options.requests,
		succeeded: tally.samples.len(),
		failed: tally.failed,
		elapsed,
		latency: LatencyStats::from_samples(tally.samples),
	});
}

fn ms(d: Duration) -> String {
	format!("{:.1}ms", d.as_secs_f64() * 1000.0)
}

pub async fn run(options: BenchOptions) -> Result<()> {
	status::info(format!(
		"Sending {} requests to {} ({} at a time, {} byte payload)",
		options.requests, options.endpoint, options.concurrency, options.payload_size
	));

	let style = ProgressStyle::with_template(&format!(
		"{} {} {}",
		"{spinner:.darkgrey}",
		"{bar:30}".dark_grey(),
		"{pos}/{len} ({elapsed})"
	))?
	.progress_chars("=> ");
	let progress = ProgressBar::new(options.requests as u64).with_style(style);

	let report = bench(&options, &progress).await?;

	println!();
	status::heading("Results");
	println!("  requests:   {}", report.total);
	println!("  succeeded:  {}", report.succeeded);
	println!("  failed:     {}", report.failed);
	println!("  throughput: {:.1} req/s", report.requests_per_second());

	if let Some(l) = report.latency {
		println!(
			"  latency:    min {}, mean {}, p50 {}, p95 {}, max {}",
			ms(l.min),
			ms(l.mean),
			ms(l.p50),
			ms(l.p95),
			ms(l.max)
		);
	}

	println!();
	if report.failed == 0 {
		status::success("All requests succeeded");
	} else if report.succeeded == 0 {
		anyhow::bail!("every request failed, is anything listening on {}?", options.endpoint);
	} else {
		status::warning(format!("{} failed", status::count(report.failed, "request")));
	}

	return Ok(());
}
