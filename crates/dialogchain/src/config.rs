use dialogchain_util::logging::LoggingPreset;
use serde::Deserialize;
use std::path::PathBuf;

/// Note that the field of this struct are not capitalized.
/// Envy is case-insensitive, and expects Rust fields to be snake_case.
#[derive(Debug, Deserialize, Clone)]
pub struct DialogChainConfig {
	/// The logging level to run with
	#[serde(default)]
	pub dialogchain_loglevel: LoggingPreset,

	/// Where the toolchain is installed.
	/// Defaults to `~/.dialogchain`.
	#[serde(default)]
	pub dialogchain_home: Option<PathBuf>,

	/// The endpoint `bench` sends requests to
	#[serde(default = "DialogChainConfig::default_bench_endpoint")]
	pub dialogchain_bench_endpoint: String,

	/// How many requests `bench` sends
	#[serde(default = "DialogChainConfig::default_bench_requests")]
	pub dialogchain_bench_requests: usize,

	/// How many `bench` requests may be in flight at once
	#[serde(default = "DialogChainConfig::default_bench_concurrency")]
	pub dialogchain_bench_concurrency: usize,

	/// The size, in bytes, of each `bench` request's message
	#[serde(default = "DialogChainConfig::default_bench_payload_size")]
	pub dialogchain_bench_payload_size: usize,

	/// Per-request timeout for `bench`, in milliseconds
	#[serde(default = "DialogChainConfig::default_bench_timeout_ms")]
	pub dialogchain_bench_timeout_ms: u64,

	/// The directory `logs` scans
	#[serde(default = "DialogChainConfig::default_log_dir")]
	pub dialogchain_log_dir: PathBuf,

	/// `logs` only reads files modified this many hours ago or later
	#[serde(default = "DialogChainConfig::default_log_since_hours")]
	pub dialogchain_log_since_hours: u64,
}

impl DialogChainConfig {
	fn default_bench_endpoint() -> String {
		"http://localhost:8080/webhook".to_owned()
	}

	fn default_bench_requests() -> usize {
		100
	}

	fn default_bench_concurrency() -> usize {
		10
	}

	fn default_bench_payload_size() -> usize {
		1024
	}

	fn default_bench_timeout_ms() -> u64 {
		10_000
	}

	fn default_log_dir() -> PathBuf {
		PathBuf::from("logs")
	}

	fn default_log_since_hours() -> u64 {
		24
	}

	/// The install directory, if we can find one
	pub fn home(&self) -> Option<PathBuf> {
		self.dialogchain_home.clone().or_else(|| {
			std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".dialogchain"))
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dialogchain_util::parse_env;

	fn vars(v: &[(&str, &str)]) -> Vec<(String, String)> {
		v.iter()
			.map(|(a, b)| ((*a).to_owned(), (*b).to_owned()))
			.collect()
	}

	#[test]
	fn defaults() {
		let c: DialogChainConfig = parse_env(vars(&[])).unwrap();
		assert_eq!(c.dialogchain_loglevel, LoggingPreset::Default);
		assert_eq!(c.dialogchain_bench_endpoint, "http://localhost:8080/webhook");
		assert_eq!(c.dialogchain_bench_requests, 100);
		assert_eq!(c.dialogchain_bench_concurrency, 10);
		assert_eq!(c.dialogchain_bench_payload_size, 1024);
		assert_eq!(c.dialogchain_bench_timeout_ms, 10_000);
		assert_eq!(c.dialogchain_log_dir, PathBuf::from("logs"));
		assert_eq!(c.dialogchain_log_since_hours, 24);
	}

	#[test]
	fn from_vars() {
		let c: DialogChainConfig = parse_env(vars(&[
			("DIALOGCHAIN_LOGLEVEL", "develop"),
			("DIALOGCHAIN_HOME", "/opt/dialogchain"),
			("DIALOGCHAIN_BENCH_ENDPOINT", "http://example.com:9000/in"),
			("DIALOGCHAIN_BENCH_CONCURRENCY", "32"),
			("DIALOGCHAIN_LOG_SINCE_HOURS", "2"),
			("UNRELATED", "x"),
		]))
		.unwrap();

		assert_eq!(c.dialogchain_loglevel, LoggingPreset::Develop);
		assert_eq!(c.home(), Some(PathBuf::from("/opt/dialogchain")));
		assert_eq!(c.dialogchain_bench_endpoint, "http://example.com:9000/in");
		assert_eq!(c.dialogchain_bench_concurrency, 32);
		assert_eq!(c.dialogchain_log_since_hours, 2);
	}
}
