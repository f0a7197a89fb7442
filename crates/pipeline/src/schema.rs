//! The pipeline configuration document.
//!
//! A pipeline is described by one YAML file (usually `pipeline.yaml`).
//! These types mirror that file. Type-specific fields
//! (`port`, `script`, `smtp`, ...) are kept in a flattened `fields`
//! map, so documents survive a read/write cycle unchanged.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::{collections::BTreeMap, fmt::Display};

/// Top-level keys every pipeline document must have
pub const REQUIRED_KEYS: [&str; 4] = ["name", "triggers", "processors", "outputs"];

//
// MARK: Entity types
//

/// Implements string conversions for an entity type enum
/// with a catch-all `Other(String)` variant.
macro_rules! entity_type {
	($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
		impl $name {
			/// All known types, in declaration order
			pub const KNOWN: &'static [&'static str] = &[$($text),+];

			/// This type as it appears in a pipeline document
			pub fn as_str(&self) -> &str {
				match self {
					$(Self::$variant => $text,)+
					Self::Other(s) => s,
				}
			}

			/// Is this one of the types we know about?
			pub fn is_known(&self) -> bool {
				!matches!(self, Self::Other(_))
			}
		}

		impl From<String> for $name {
			fn from(value: String) -> Self {
				match value.as_str() {
					$($text => Self::$variant,)+
					_ => Self::Other(value),
				}
			}
		}

		impl From<&str> for $name {
			fn from(value: &str) -> Self {
				Self::from(value.to_owned())
			}
		}

		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.as_str().to_owned()
			}
		}

		impl Display for $name {
			fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
				write!(f, "{}", self.as_str())
			}
		}
	};
}

/// Where a pipeline's data comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerType {
	Http,
	Mqtt,
	Timer,
	FileWatch,
	Grpc,
	WebSocket,
	Other(String),
}

entity_type!(TriggerType {
	Http => "http",
	Mqtt => "mqtt",
	Timer => "timer",
	FileWatch => "file_watch",
	Grpc => "grpc",
	WebSocket => "websocket",
});

impl TriggerType {
	/// Fields a trigger of this type needs to be usable
	pub fn required_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Http => &["port", "path"],
			Self::Mqtt => &["broker", "topic"],
			Self::Timer => &["interval_ms"],
			Self::FileWatch => &["path"],
			Self::Grpc => &["port", "service"],
			Self::WebSocket => &["port"],
			Self::Other(_) => &[],
		}
	}
}

/// The runtime a processor is implemented in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProcessorType {
	Python,
	Go,
	RustWasm,
	Node,
	Docker,
	Native,
	Llm,
	Other(String),
}

entity_type!(ProcessorType {
	Python => "python",
	Go => "go",
	RustWasm => "rust_wasm",
	Node => "node",
	Docker => "docker",
	Native => "native",
	Llm => "llm",
});

impl ProcessorType {
	/// Fields a processor of this type needs to be usable
	pub fn required_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Python | Self::Node => &["script"],
			Self::Go => &["binary"],
			Self::RustWasm => &["wasm"],
			Self::Docker => &["image"],
			Self::Native => &["function"],
			Self::Llm => &["model"],
			Self::Other(_) => &[],
		}
	}
}

/// Where processed data goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutputType {
	Email,
	WebSocket,
	Mqtt,
	Database,
	File,
	Http,
	Other(String),
}

entity_type!(OutputType {
	Email => "email",
	WebSocket => "websocket",
	Mqtt => "mqtt",
	Database => "database",
	File => "file",
	Http => "http",
});

impl OutputType {
	/// Fields an output of this type needs to be usable
	pub fn required_fields(&self) -> &'static [&'static str] {
		match self {
			Self::Email => &["smtp", "to"],
			Self::WebSocket | Self::Http => &["url"],
			Self::Mqtt => &["broker", "topic"],
			Self::Database => &["connection", "table"],
			Self::File => &["path"],
			Self::Other(_) => &[],
		}
	}
}

/// The three kinds of entity a pipeline contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
	Trigger,
	Processor,
	Output,
}

impl Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Trigger => write!(f, "trigger"),
			Self::Processor => write!(f, "processor"),
			Self::Output => write!(f, "output"),
		}
	}
}

//
// MARK: Scalars
//

/// String fields that accept any YAML scalar as the text it was written as,
/// so `version: 1.0`, `name: 2024` and `WORKERS: 4` all read as strings.
mod scalar {
	use super::*;

	fn text(value: &Value) -> Option<String> {
		match value {
			Value::String(s) => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			Value::Bool(b) => Some(b.to_string()),
			Value::Tagged(t) => text(&t.value),
			Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
		}
	}

	fn expected<E: de::Error>(value: &Value) -> E {
		let found = match value {
			Value::Null => "null",
			Value::Sequence(_) => "a sequence",
			Value::Mapping(_) => "a mapping",
			_ => "a scalar",
		};
		E::custom(format_args!("expected a string, found {found}"))
	}

	fn required<E: de::Error>(value: &Value) -> Result<String, E> {
		text(value).ok_or_else(|| expected(value))
	}

	pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
		required(&Value::deserialize(d)?)
	}

	pub fn optional<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
		match Value::deserialize(d)? {
			Value::Null => Ok(None),
			v => required(&v).map(Some),
		}
	}

	pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
		match Value::deserialize(d)? {
			Value::Null => Ok(Vec::new()),
			Value::Sequence(items) => items.iter().map(required::<D::Error>).collect(),
			v => Err(expected(&v)),
		}
	}

	pub fn optional_map<'de, D: Deserializer<'de>>(
		d: D,
	) -> Result<Option<BTreeMap<String, String>>, D::Error> {
		match Value::deserialize(d)? {
			Value::Null => Ok(None),
			Value::Mapping(m) => m
				.iter()
				.map(|(k, v)| Ok::<_, D::Error>((required(k)?, required(v)?)))
				.collect::<Result<_, _>>()
				.map(Some),
			v => Err(de::Error::custom(format_args!(
				"expected a mapping, found {}",
				match v {
					Value::Sequence(_) => "a sequence",
					_ => "a scalar",
				}
			))),
		}
	}
}

//
// MARK: Entities
//

/// A declared input source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
	#[serde(deserialize_with = "scalar::string")]
	pub id: String,

	#[serde(rename = "type")]
	pub trigger_type: TriggerType,

	#[serde(default = "Trigger::default_enabled")]
	pub enabled: bool,

	/// Type-specific fields
	#[serde(flatten)]
	pub fields: BTreeMap<String, Value>,
}

impl Trigger {
	fn default_enabled() -> bool {
		true
	}
}

/// A declared unit of data transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Processor {
	#[serde(deserialize_with = "scalar::string")]
	pub id: String,

	#[serde(rename = "type")]
	pub processor_type: ProcessorType,

	/// Can this processor handle several inputs at once?
	#[serde(default)]
	pub parallel: bool,

	/// Timeout, in milliseconds
	#[serde(default = "Processor::default_timeout")]
	pub timeout: u64,

	/// How many times to retry a failed run
	#[serde(default)]
	pub retry: u32,

	/// Processors that must finish before this one starts
	#[serde(default, deserialize_with = "scalar::list")]
	pub dependencies: Vec<String>,

	#[serde(default, deserialize_with = "scalar::optional_map")]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub environment: Option<BTreeMap<String, String>>,

	/// Type-specific fields
	#[serde(flatten)]
	pub fields: BTreeMap<String, Value>,
}

impl Processor {
	fn default_timeout() -> u64 {
		5000
	}
}

/// A declared destination for processed data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
	#[serde(deserialize_with = "scalar::string")]
	pub id: String,

	#[serde(rename = "type")]
	pub output_type: OutputType,

	/// A boolean expression gating this output.
	/// Carried verbatim, never evaluated.
	#[serde(default, deserialize_with = "scalar::optional")]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub condition: Option<String>,

	#[serde(default)]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub batch_size: Option<usize>,

	/// Type-specific fields
	#[serde(flatten)]
	pub fields: BTreeMap<String, Value>,
}

//
// MARK: Document
//

/// A complete pipeline document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
	#[serde(deserialize_with = "scalar::string")]
	pub name: String,

	#[serde(default, deserialize_with = "scalar::optional")]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,

	#[serde(default, deserialize_with = "scalar::optional")]
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,

	pub triggers: Vec<Trigger>,
	pub processors: Vec<Processor>,
	pub outputs: Vec<Output>,

	/// Free-form settings.
	/// See [`crate::settings::PipelineSettings`] for the conventional keys.
	#[serde(default)]
	#[serde(skip_serializing_if = "Value::is_null")]
	pub settings: Value,
}

impl PipelineConfig {
	/// Parse a pipeline document without any validation beyond its shape.
	/// Use [`crate::validate::validate_str`] to check a document.
	pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
		serde_yaml::from_str(text)
	}

	/// Serialize this pipeline as a YAML document
	pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
		serde_yaml::to_string(self)
	}

	/// Find a processor by id
	pub fn get_processor(&self, id: &str) -> Option<&Processor> {
		self.processors.iter().find(|p| p.id == id)
	}
}
