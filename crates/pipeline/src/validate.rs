//! Pipeline document validation
//!
//! Checks run in stages. The first stage that fails ends validation,
//! so a document that isn't valid YAML never gets schema results.
//!
//! 1. the file exists
//! 2. the text is valid YAML
//! 3. every key in [`REQUIRED_KEYS`] is present
//! 4. the document has the right shape, ids are unique,
//!    and processor dependencies form a DAG
//!
//! Anything else we notice is reported as a [`ValidationWarning`].

use serde_yaml::Value;
use std::{
	collections::HashSet,
	fmt::Display,
	io::ErrorKind,
	path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
	graph::{GraphError, ProcessorGraph},
	schema::{EntityKind, PipelineConfig, REQUIRED_KEYS},
};

/// Why a pipeline document is invalid
#[derive(Debug, Error)]
pub enum ValidateError {
	/// The file doesn't exist
	#[error("file `{}` not found", .path.display())]
	NotFound { path: PathBuf },

	/// The file exists, but we couldn't read it
	#[error("could not read file")]
	CouldNotReadFile(#[from] std::io::Error),

	/// The text isn't valid YAML
	#[error("invalid YAML: {0}")]
	ParseError(serde_yaml::Error),

	/// Required top-level keys are missing
	#[error("missing required keys: {}", .missing.join(", "))]
	SchemaError {
		/// Every missing key, in [`REQUIRED_KEYS`] order
		missing: Vec<&'static str>,
	},

	/// All keys are present, but they hold the wrong kind of data
	#[error("invalid document structure: {0}")]
	InvalidStructure(serde_yaml::Error),

	/// Two triggers or two outputs share an id
	#[error("{kind} id `{id}` is used more than once")]
	DuplicateId { kind: EntityKind, id: String },

	/// Processor dependencies are broken
	#[error(transparent)]
	Graph(#[from] GraphError),
}

/// Something suspicious that doesn't make a document invalid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
	/// This document has no `version`
	NoVersion,

	/// A list is empty
	NoEntities { kind: EntityKind },

	/// An entity has an empty id
	EmptyId { kind: EntityKind },

	/// An entity's type isn't one we know
	UnknownType {
		kind: EntityKind,
		id: String,
		type_name: String,
	},

	/// An entity is missing a field its type needs
	MissingField {
		kind: EntityKind,
		id: String,
		field: &'static str,
	},

	/// A processor has a zero timeout
	ZeroTimeout { id: String },

	/// The `settings` block has unexpected values for known keys
	BadSettings { message: String },
}

impl Display for ValidationWarning {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NoVersion => write!(f, "pipeline has no version"),
			Self::NoEntities { kind } => write!(f, "pipeline has no {kind}s"),
			Self::EmptyId { kind } => write!(f, "a {kind} has an empty id"),
			Self::UnknownType {
				kind,
				id,
				type_name,
			} => write!(f, "{kind} `{id}` has unknown type `{type_name}`"),
			Self::MissingField { kind, id, field } => {
				write!(f, "{kind} `{id}` is missing field `{field}`")
			}
			Self::ZeroTimeout { id } => write!(f, "processor `{id}` has a zero timeout"),
			Self::BadSettings { message } => write!(f, "unexpected settings: {message}"),
		}
	}
}

/// The result of validating a pipeline document
#[derive(Debug)]
pub struct ValidationReport {
	/// The parsed document
	pub config: PipelineConfig,

	/// The processor dependency graph
	pub graph: ProcessorGraph,

	/// Everything suspicious we found
	pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
	/// Processor ids in execution order
	pub fn order(&self) -> Vec<&str> {
		self.graph.topological_order()
	}
}

/// Validate the pipeline document at `path`.
pub fn validate_file(path: &Path) -> Result<ValidationReport, ValidateError> {
	debug!(message = "Validating pipeline file", ?path);

	let text = match std::fs::read_to_string(path) {
		Ok(x) => x,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			return Err(ValidateError::NotFound {
				path: path.to_owned(),
			})
		}
		Err(err) => return Err(err.into()),
	};

	validate_str(&text)
}

/// Validate a pipeline document.
pub fn validate_str(text: &str) -> Result<ValidationReport, ValidateError> {
	let value: Value = serde_yaml::from_str(text).map_err(ValidateError::ParseError)?;

	trace!(message = "Checking required keys");
	let missing = missing_keys(&value);
	if !missing.is_empty() {
		return Err(ValidateError::SchemaError { missing });
	}

	trace!(message = "Checking document structure");
	let config: PipelineConfig =
		serde_yaml::from_value(value).map_err(ValidateError::InvalidStructure)?;

	check_unique(EntityKind::Trigger, config.triggers.iter().map(|t| &t.id))?;
	check_unique(EntityKind::Output, config.outputs.iter().map(|o| &o.id))?;

	trace!(message = "Checking processor dependencies");
	let graph = ProcessorGraph::from_processors(&config.processors)?;

	let warnings = collect_warnings(&config);
	debug!(
		message = "Pipeline is valid",
		name = config.name,
		warnings = warnings.len()
	);

	return Ok(ValidationReport {
		config,
		graph,
		warnings,
	});
}

/// Required keys that `document` doesn't have.
/// A document that isn't a mapping is missing all of them.
pub fn missing_keys(document: &Value) -> Vec<&'static str> {
	REQUIRED_KEYS
		.iter()
		.filter(|k| document.get(**k).is_none())
		.copied()
		.collect()
}

fn check_unique<'a>(
	kind: EntityKind,
	ids: impl Iterator<Item = &'a String>,
) -> Result<(), ValidateError> {
	let mut seen = HashSet::new();
	for id in ids {
		if !seen.insert(id) {
			return Err(ValidateError::DuplicateId {
				kind,
				id: id.clone(),
			});
		}
	}
	return Ok(());
}

fn collect_warnings(config: &PipelineConfig) -> Vec<ValidationWarning> {
	let mut w = Vec::new();

	if config.version.is_none() {
		w.push(ValidationWarning::NoVersion);
	}

	for (kind, len) in [
		(EntityKind::Trigger, config.triggers.len()),
		(EntityKind::Processor, config.processors.len()),
		(EntityKind::Output, config.outputs.len()),
	] {
		if len == 0 {
			w.push(ValidationWarning::NoEntities { kind });
		}
	}

	let mut check = |kind: EntityKind,
	                 id: &str,
	                 type_name: &str,
	                 known: bool,
	                 required: &'static [&'static str],
	                 has_field: &dyn Fn(&str) -> bool| {
		if id.is_empty() {
			w.push(ValidationWarning::EmptyId { kind });
		}

		if !known {
			w.push(ValidationWarning::UnknownType {
				kind,
				id: id.to_owned(),
				type_name: type_name.to_owned(),
			});
		}

		for field in required {
			if !has_field(field) {
				w.push(ValidationWarning::MissingField {
					kind,
					id: id.to_owned(),
					field: *field,
				});
			}
		}
	};

	for t in &config.triggers {
		check(
			EntityKind::Trigger,
			&t.id,
			t.trigger_type.as_str(),
			t.trigger_type.is_known(),
			t.trigger_type.required_fields(),
			&|f: &str| t.fields.contains_key(f),
		);
	}

	for p in &config.processors {
		check(
			EntityKind::Processor,
			&p.id,
			p.processor_type.as_str(),
			p.processor_type.is_known(),
			p.processor_type.required_fields(),
			&|f: &str| p.fields.contains_key(f),
		);
	}

	for o in &config.outputs {
		check(
			EntityKind::Output,
			&o.id,
			o.output_type.as_str(),
			o.output_type.is_known(),
			o.output_type.required_fields(),
			&|f: &str| o.fields.contains_key(f),
		);
	}

	for p in &config.processors {
		if p.timeout == 0 {
			w.push(ValidationWarning::ZeroTimeout { id: p.id.clone() });
		}
	}

	if let Err(e) = crate::settings::PipelineSettings::from_value(&config.settings) {
		w.push(ValidationWarning::BadSettings {
			message: e.to_string(),
		});
	}

	return w;
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const VALID: &str = r#"
name: demo
version: "1.0.0"
triggers:
  - id: http_input
    type: http
    port: 8080
    path: /webhook
processors:
  - id: enrich
    type: python
    script: processors/enrich.py
    dependencies: [parse]
  - id: parse
    type: python
    script: processors/parse.py
outputs:
  - id: file_output
    type: file
    path: logs/output.log
"#;

	#[test]
	fn valid_document() {
		let r = validate_str(VALID).unwrap();
		assert_eq!(r.config.name, "demo");
		assert_eq!(r.order(), vec!["parse", "enrich"]);
		assert!(r.warnings.is_empty(), "{:?}", r.warnings);
	}

	#[test]
	fn minimal_document_is_valid() {
		let r = validate_str("name: x\ntriggers: []\nprocessors: []\noutputs: []").unwrap();
		assert!(r.warnings.contains(&ValidationWarning::NoVersion));
		assert!(r.warnings.contains(&ValidationWarning::NoEntities {
			kind: EntityKind::Processor
		}));
	}

	#[test]
	fn missing_each_key() {
		let lines = [
			("name", "name: x"),
			("triggers", "triggers: []"),
			("processors", "processors: []"),
			("outputs", "outputs: []"),
		];

		for (key, _) in lines {
			let doc = lines
				.iter()
				.filter(|(k, _)| *k != key)
				.map(|(_, l)| *l)
				.collect::<Vec<_>>()
				.join("\n");

			match validate_str(&doc) {
				Err(ValidateError::SchemaError { missing }) => assert_eq!(missing, vec![key]),
				x => panic!("expected schema error, got {x:?}"),
			}
		}
	}

	#[test]
	fn missing_keys_are_all_listed() {
		match validate_str("name: x\nprocessors: []") {
			Err(ValidateError::SchemaError { missing }) => {
				assert_eq!(missing, vec!["triggers", "outputs"])
			}
			x => panic!("expected schema error, got {x:?}"),
		}

		match validate_str("outputs: []") {
			Err(ValidateError::SchemaError { missing }) => {
				assert_eq!(missing, vec!["name", "triggers", "processors"])
			}
			x => panic!("expected schema error, got {x:?}"),
		}
	}

	#[test]
	fn non_mapping_is_missing_everything() {
		match validate_str("- a\n- b") {
			Err(ValidateError::SchemaError { missing }) => assert_eq!(missing, REQUIRED_KEYS),
			x => panic!("expected schema error, got {x:?}"),
		}
	}

	#[test]
	fn malformed_yaml_is_a_parse_error() {
		let e = validate_str("name: \"unterminated\ntriggers: []").unwrap_err();
		assert!(matches!(e, ValidateError::ParseError(_)), "{e:?}");

		// Even if keys are missing, we never get past parsing
		let e = validate_str("processors: [").unwrap_err();
		assert!(matches!(e, ValidateError::ParseError(_)), "{e:?}");
	}

	#[test]
	fn numeric_scalars_are_valid() {
		let r = validate_str("name: demo\nversion: 1.0\ntriggers: []\nprocessors: []\noutputs: []")
			.unwrap();
		assert_eq!(r.config.version.as_deref(), Some("1.0"));
		assert!(!r.warnings.contains(&ValidationWarning::NoVersion));

		let r = validate_str("name: 2024\ntriggers: []\nprocessors: []\noutputs: []").unwrap();
		assert_eq!(r.config.name, "2024");

		let r = validate_str(
			r#"
name: workers
triggers: []
processors:
  - id: 1
    type: python
    script: processors/one.py
    environment:
      WORKERS: 4
      VERBOSE: true
  - id: 2
    type: python
    script: processors/two.py
    dependencies: [1]
outputs: []
"#,
		)
		.unwrap();
		assert_eq!(r.order(), vec!["1", "2"]);

		let env = r.config.processors[0].environment.as_ref().unwrap();
		assert_eq!(env.get("WORKERS").map(String::as_str), Some("4"));
		assert_eq!(env.get("VERBOSE").map(String::as_str), Some("true"));
	}

	#[test]
	fn wrong_shape() {
		let e = validate_str("name: x\ntriggers: 3\nprocessors: []\noutputs: []").unwrap_err();
		assert!(matches!(e, ValidateError::InvalidStructure(_)), "{e:?}");
	}

	#[test]
	fn duplicate_trigger_id() {
		let e = validate_str(
			"name: x\ntriggers: [{id: a, type: timer, interval_ms: 5}, {id: a, type: timer, interval_ms: 5}]\nprocessors: []\noutputs: []",
		)
		.unwrap_err();
		assert!(matches!(
			e,
			ValidateError::DuplicateId { kind: EntityKind::Trigger, ref id } if id == "a"
		));
	}

	#[test]
	fn dependency_errors() {
		let e = validate_str(
			"name: x\ntriggers: []\nprocessors: [{id: a, type: native, function: f, dependencies: [b]}]\noutputs: []",
		)
		.unwrap_err();
		assert!(matches!(
			e,
			ValidateError::Graph(GraphError::UnknownDependency { .. })
		));

		let e = validate_str(
			"name: x\ntriggers: []\nprocessors: [{id: a, type: native, dependencies: [b]}, {id: b, type: native, dependencies: [a]}]\noutputs: []",
		)
		.unwrap_err();
		assert!(matches!(e, ValidateError::Graph(GraphError::HasCycle { .. })));
	}

	#[test]
	fn soft_problems_are_warnings() {
		let r = validate_str(
			"name: x\nversion: '1'\ntriggers: [{id: t, type: carrier_pigeon}]\nprocessors: [{id: p, type: docker, timeout: 0}]\noutputs: [{id: '', type: email, smtp: s, to: [a]}]",
		)
		.unwrap();

		assert!(r.warnings.contains(&ValidationWarning::UnknownType {
			kind: EntityKind::Trigger,
			id: "t".into(),
			type_name: "carrier_pigeon".into()
		}));
		assert!(r.warnings.contains(&ValidationWarning::MissingField {
			kind: EntityKind::Processor,
			id: "p".into(),
			field: "image"
		}));
		assert!(r
			.warnings
			.contains(&ValidationWarning::ZeroTimeout { id: "p".into() }));
		assert!(r.warnings.contains(&ValidationWarning::EmptyId {
			kind: EntityKind::Output
		}));
	}

	#[test]
	fn file_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let e = validate_file(&dir.path().join("pipeline.yaml")).unwrap_err();
		assert!(matches!(e, ValidateError::NotFound { .. }));
	}

	#[test]
	fn validate_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("pipeline.yaml");
		std::fs::File::create(&path)
			.unwrap()
			.write_all(VALID.as_bytes())
			.unwrap();
		assert!(validate_file(&path).is_ok());
	}
}
