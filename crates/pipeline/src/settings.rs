//! Pipeline settings and per-environment overrides.
//!
//! `settings` is free-form in the document. [`PipelineSettings`]
//! is a typed view of the keys we know about; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A typed view of a pipeline's `settings` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PipelineSettings {
	#[serde(default)]
	pub performance: PerformanceSettings,

	#[serde(default)]
	pub monitoring: MonitoringSettings,

	#[serde(default)]
	pub security: SecuritySettings,
}

impl PipelineSettings {
	/// Read the known keys of a `settings` block.
	/// A missing (`null`) block gives the defaults.
	pub fn from_value(value: &Value) -> Result<Self, serde_yaml::Error> {
		if value.is_null() {
			return Ok(Self::default());
		}
		serde_yaml::from_value(value.clone())
	}

	/// Convert these settings into a `settings` block
	pub fn to_value(&self) -> Result<Value, serde_yaml::Error> {
		serde_yaml::to_value(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceSettings {
	/// How many inputs may be processed at once
	#[serde(default = "PerformanceSettings::default_max_concurrent")]
	pub max_concurrent: usize,

	/// How many inputs may wait in the queue
	#[serde(default = "PerformanceSettings::default_buffer_size")]
	pub buffer_size: usize,
}

impl Default for PerformanceSettings {
	fn default() -> Self {
		Self {
			max_concurrent: Self::default_max_concurrent(),
			buffer_size: Self::default_buffer_size(),
		}
	}
}

impl PerformanceSettings {
	fn default_max_concurrent() -> usize {
		10
	}

	fn default_buffer_size() -> usize {
		1000
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
	#[serde(default = "MonitoringSettings::default_enabled")]
	pub enabled: bool,

	#[serde(default = "MonitoringSettings::default_log_level")]
	pub log_level: String,
}

impl Default for MonitoringSettings {
	fn default() -> Self {
		Self {
			enabled: Self::default_enabled(),
			log_level: Self::default_log_level(),
		}
	}
}

impl MonitoringSettings {
	fn default_enabled() -> bool {
		true
	}

	fn default_log_level() -> String {
		"INFO".to_owned()
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SecuritySettings {
	#[serde(default)]
	pub require_auth: bool,

	/// Maximum requests per second, if limited
	#[serde(default)]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rate_limit: Option<u32>,

	#[serde(default)]
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub allowed_origins: Vec<String>,
}

/// Merge `overrides` into `base`.
///
/// Mappings are merged key by key, recursively.
/// Any other value in `overrides` replaces the value in `base`.
pub fn apply_overrides(base: &mut Value, overrides: &Value) {
	match (base, overrides) {
		(Value::Mapping(base), Value::Mapping(overrides)) => {
			for (k, v) in overrides {
				match base.get_mut(k) {
					Some(existing) => apply_overrides(existing, v),
					None => {
						base.insert(k.clone(), v.clone());
					}
				}
			}
		}

		(base, overrides) => *base = overrides.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn yaml(s: &str) -> Value {
		serde_yaml::from_str(s).unwrap()
	}

	#[test]
	fn defaults() {
		let s = PipelineSettings::from_value(&Value::Null).unwrap();
		assert_eq!(s.performance.max_concurrent, 10);
		assert_eq!(s.performance.buffer_size, 1000);
		assert!(s.monitoring.enabled);
		assert_eq!(s.monitoring.log_level, "INFO");
		assert!(!s.security.require_auth);
		assert_eq!(s.security.rate_limit, None);
	}

	#[test]
	fn partial_settings() {
		let s = PipelineSettings::from_value(&yaml(
			"performance: {max_concurrent: 3}\nsecurity: {rate_limit: 50}\ncustom: 1",
		))
		.unwrap();
		assert_eq!(s.performance.max_concurrent, 3);
		assert_eq!(s.performance.buffer_size, 1000);
		assert_eq!(s.security.rate_limit, Some(50));
	}

	#[test]
	fn overrides_merge_recursively() {
		let mut base = yaml(
			"performance: {max_concurrent: 10, buffer_size: 1000}\nsecurity: {require_auth: false}",
		);
		let over = yaml(
			"performance: {max_concurrent: 50}\nsecurity: {require_auth: true, allowed_origins: [a]}",
		);
		apply_overrides(&mut base, &over);

		let s = PipelineSettings::from_value(&base).unwrap();
		assert_eq!(s.performance.max_concurrent, 50);
		assert_eq!(s.performance.buffer_size, 1000);
		assert!(s.security.require_auth);
		assert_eq!(s.security.allowed_origins, vec!["a"]);
	}

	#[test]
	fn overrides_replace_non_mappings() {
		let mut base = yaml("a: [1, 2]\nb: x");
		apply_overrides(&mut base, &yaml("a: [3]"));
		assert_eq!(base, yaml("a: [3]\nb: x"));

		let mut null = Value::Null;
		apply_overrides(&mut null, &yaml("a: 1"));
		assert_eq!(null, yaml("a: 1"));
	}
}
