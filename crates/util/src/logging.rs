use serde::Deserialize;
use std::fmt::Display;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
	Trace,
	Debug,
	Info,
	Warn,
	Error,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self::Info
	}
}

impl Display for LogLevel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trace => write!(f, "trace"),
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warn => write!(f, "warn"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// Named sets of log levels, selected with `DIALOGCHAIN_LOGLEVEL`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LoggingPreset {
	#[serde(alias = "default")]
	Default,
	#[serde(alias = "verbose")]
	Verbose,
	#[serde(alias = "develop")]
	Develop,
	#[serde(alias = "trace")]
	Trace,
}

impl Default for LoggingPreset {
	fn default() -> Self {
		return Self::Default;
	}
}

impl LoggingPreset {
	pub fn get_config(&self) -> LoggingConfig {
		match self {
			Self::Default => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,

				cli: LogLevel::Warn,
				pipeline: LogLevel::Warn,
				scaffold: LogLevel::Warn,
			},

			Self::Verbose => LoggingConfig {
				other: LogLevel::Warn,
				http: LogLevel::Warn,

				cli: LogLevel::Info,
				pipeline: LogLevel::Info,
				scaffold: LogLevel::Info,
			},

			Self::Develop => LoggingConfig {
				other: LogLevel::Info,
				http: LogLevel::Warn,

				cli: LogLevel::Debug,
				pipeline: LogLevel::Debug,
				scaffold: LogLevel::Debug,
			},

			Self::Trace => LoggingConfig {
				other: LogLevel::Trace,
				http: LogLevel::Debug,

				cli: LogLevel::Trace,
				pipeline: LogLevel::Trace,
				scaffold: LogLevel::Trace,
			},
		}
	}
}

pub struct LoggingConfig {
	other: LogLevel,
	http: LogLevel,

	cli: LogLevel,
	pipeline: LogLevel,
	scaffold: LogLevel,
}

impl LoggingConfig {
	/// The filter directives for this config, as accepted by [`EnvFilter`]
	pub fn to_directives(&self) -> String {
		[
			//
			// Non-configurable sources
			//
			format!("hyper={}", LogLevel::Warn),
			format!("rustls={}", LogLevel::Warn),
			//
			// Configurable sources
			//
			format!("reqwest={}", self.http),
			format!("dialogchain_pipeline={}", self.pipeline),
			format!("dialogchain_scaffold={}", self.scaffold),
			format!("dialogchain={}", self.cli),
			self.other.to_string(),
		]
		.join(",")
	}
}

impl From<LoggingConfig> for EnvFilter {
	fn from(value: LoggingConfig) -> Self {
		EnvFilter::new(value.to_directives())
	}
}
