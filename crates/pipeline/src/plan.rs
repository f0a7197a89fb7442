//! Execution plans.
//!
//! There is no pipeline runtime here. A plan is what a runtime would
//! need: a validated document with its environment's settings applied
//! and its processors grouped into stages.

use serde_yaml::Value;
use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};
use dialogchain_util::names::{check_dir_name, NameError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
	settings::{apply_overrides, PipelineSettings},
	validate::{validate_file, ValidateError, ValidationWarning},
};

/// The environment `dev` uses if none is given
pub const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Error)]
pub enum PlanError {
	#[error(transparent)]
	Validate(#[from] ValidateError),

	#[error("invalid environment name `{name}`")]
	BadEnvironment {
		name: String,
		#[source]
		source: NameError,
	},

	#[error("could not read `{}`", .path.display())]
	CouldNotReadOverrides {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid overrides in `{}`", .path.display())]
	BadOverrides {
		path: PathBuf,
		#[source]
		source: serde_yaml::Error,
	},

	#[error("invalid settings")]
	BadSettings(#[source] serde_yaml::Error),
}

/// Everything needed to run a pipeline
#[derive(Debug)]
pub struct ExecutionPlan {
	pub name: String,

	/// The environment whose overrides were applied
	pub environment: String,

	/// The overrides file we applied, if we found one
	pub overrides: Option<PathBuf>,

	pub settings: PipelineSettings,

	/// Ids of enabled triggers
	pub triggers: Vec<String>,

	/// Processor ids, grouped into stages that may run side by side
	pub stages: Vec<Vec<String>>,

	/// Ids of all outputs
	pub outputs: Vec<String>,

	pub warnings: Vec<ValidationWarning>,
}

/// The overrides file of `environment` for the pipeline at `pipeline`.
/// `environment` must be a single path component.
pub fn overrides_path(pipeline: &Path, environment: &str) -> Result<PathBuf, PlanError> {
	check_dir_name(environment).map_err(|source| PlanError::BadEnvironment {
		name: environment.to_owned(),
		source,
	})?;

	return Ok(pipeline
		.parent()
		.unwrap_or(Path::new("."))
		.join("configs")
		.join(format!("{environment}.yaml")));
}

/// Validate the pipeline at `path` and plan its execution in `environment`.
///
/// Settings overrides are read from `configs/<environment>.yaml` next
/// to the pipeline file. A missing overrides file is not an error.
pub fn plan_file(path: &Path, environment: &str) -> Result<ExecutionPlan, PlanError> {
	let overrides = overrides_path(path, environment)?;
	let report = validate_file(path)?;
	let mut settings = report.config.settings.clone();

	let overrides = match std::fs::read_to_string(&overrides) {
		Ok(text) => {
			let value: Value =
				serde_yaml::from_str(&text).map_err(|source| PlanError::BadOverrides {
					path: overrides.clone(),
					source,
				})?;

			if settings.is_null() {
				settings = Value::Mapping(Default::default());
			}
			apply_overrides(&mut settings, &value);
			debug!(message = "Applied settings overrides", path = ?overrides);
			Some(overrides)
		}

		Err(err) if err.kind() == ErrorKind::NotFound => {
			warn!(
				message = "No settings overrides for environment, using defaults",
				environment,
				path = ?overrides
			);
			None
		}

		Err(source) => {
			return Err(PlanError::CouldNotReadOverrides {
				path: overrides,
				source,
			})
		}
	};

	let settings = PipelineSettings::from_value(&settings).map_err(PlanError::BadSettings)?;

	let stages: Vec<Vec<String>> = report
		.graph
		.stages()
		.into_iter()
		.map(|s| s.into_iter().map(|x| x.to_owned()).collect())
		.collect();

	info!(
		message = "Planned pipeline",
		name = report.config.name,
		environment,
		stages = stages.len()
	);

	return Ok(ExecutionPlan {
		name: report.config.name.clone(),
		environment: environment.to_owned(),
		overrides,
		settings,
		triggers: report
			.config
			.triggers
			.iter()
			.filter(|t| t.enabled)
			.map(|t| t.id.clone())
			.collect(),
		stages,
		outputs: report.config.outputs.iter().map(|o| o.id.clone()).collect(),
		warnings: report.warnings,
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	const DOC: &str = r#"
name: planned
version: "1.0.0"
triggers:
  - {id: web, type: http, port: 8080, path: /in}
  - {id: off, type: timer, interval_ms: 10, enabled: false}
processors:
  - {id: report, type: python, script: r.py, dependencies: [left, right]}
  - {id: left, type: python, script: l.py}
  - {id: right, type: python, script: r.py}
outputs:
  - {id: out, type: file, path: out.log}
settings:
  performance: {max_concurrent: 10}
  security: {require_auth: false, rate_limit: 1000}
"#;

	fn project() -> tempfile::TempDir {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("pipeline.yaml"), DOC).unwrap();
		fs::create_dir(dir.path().join("configs")).unwrap();
		fs::write(
			dir.path().join("configs/production.yaml"),
			"performance: {max_concurrent: 50}\nsecurity: {require_auth: true, rate_limit: 100}\n",
		)
		.unwrap();
		dir
	}

	#[test]
	fn plan_with_overrides() {
		let dir = project();
		let plan = plan_file(&dir.path().join("pipeline.yaml"), "production").unwrap();

		assert_eq!(plan.name, "planned");
		assert_eq!(plan.triggers, vec!["web"]);
		assert_eq!(plan.stages, vec![vec!["left", "right"], vec!["report"]]);
		assert_eq!(plan.outputs, vec!["out"]);
		assert_eq!(
			plan.overrides,
			Some(dir.path().join("configs/production.yaml"))
		);
		assert_eq!(plan.settings.performance.max_concurrent, 50);
		assert_eq!(plan.settings.performance.buffer_size, 1000);
		assert!(plan.settings.security.require_auth);
		assert_eq!(plan.settings.security.rate_limit, Some(100));
	}

	#[test]
	fn missing_overrides_use_document_settings() {
		let dir = project();
		let plan = plan_file(&dir.path().join("pipeline.yaml"), DEFAULT_ENVIRONMENT).unwrap();
		assert_eq!(plan.overrides, None);
		assert_eq!(plan.settings.performance.max_concurrent, 10);
		assert!(!plan.settings.security.require_auth);
	}

	#[test]
	fn bad_overrides() {
		let dir = project();
		fs::write(dir.path().join("configs/broken.yaml"), "a: [unclosed").unwrap();
		let e = plan_file(&dir.path().join("pipeline.yaml"), "broken").unwrap_err();
		assert!(matches!(e, PlanError::BadOverrides { .. }));
	}

	#[test]
	fn environment_must_stay_in_configs() {
		let dir = project();
		fs::write(dir.path().join("escape.yaml"), "performance: {max_concurrent: 1}\n").unwrap();

		for env in ["../escape", "a/b", "..", ""] {
			let e = plan_file(&dir.path().join("pipeline.yaml"), env).unwrap_err();
			assert!(matches!(e, PlanError::BadEnvironment { .. }), "{env}: {e:?}");
		}

		assert_eq!(
			overrides_path(Path::new("p/pipeline.yaml"), "staging").unwrap(),
			Path::new("p/configs/staging.yaml")
		);
	}

	#[test]
	fn invalid_pipeline() {
		let dir = tempfile::tempdir().unwrap();
		let e = plan_file(&dir.path().join("pipeline.yaml"), DEFAULT_ENVIRONMENT).unwrap_err();
		assert!(matches!(
			e,
			PlanError::Validate(ValidateError::NotFound { .. })
		));
	}
}
