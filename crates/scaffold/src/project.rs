//! Built-in project templates

use dialogchain_pipeline::{
	schema::{Output, PipelineConfig, Processor, Trigger},
	settings::PipelineSettings,
};
use serde::Deserialize;
use std::collections::BTreeMap;

/// The template `create` uses if none is given
pub const DEFAULT_TEMPLATE: &str = "basic";

const BUILTIN: [(&str, &str); 3] = [
	("basic", include_str!("../templates/basic.yaml")),
	("security", include_str!("../templates/security.yaml")),
	("iot", include_str!("../templates/iot.yaml")),
];

/// Everything we need to generate a project
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectTemplate {
	pub name: String,
	pub description: String,

	/// Lines of `requirements.txt`
	#[serde(default)]
	pub python_packages: Vec<String>,

	/// Tools this project needs on the host.
	/// Shown by `templates`, never installed.
	#[serde(default)]
	pub system_packages: Vec<String>,

	/// Extra docker-compose services the project depends on
	#[serde(default)]
	pub services: Vec<String>,

	/// Variables for `.env.example`
	#[serde(default)]
	pub environment: BTreeMap<String, String>,

	pub triggers: Vec<Trigger>,
	pub processors: Vec<Processor>,
	pub outputs: Vec<Output>,
}

impl ProjectTemplate {
	/// The names of all built-in templates
	pub fn builtin_names() -> impl Iterator<Item = &'static str> {
		BUILTIN.iter().map(|(n, _)| *n)
	}

	/// Load a built-in template.
	/// Returns `Ok(None)` if there is no template named `name`.
	pub fn builtin(name: &str) -> Result<Option<Self>, serde_yaml::Error> {
		match BUILTIN.iter().find(|(n, _)| *n == name) {
			None => Ok(None),
			Some((_, text)) => Ok(Some(serde_yaml::from_str(text)?)),
		}
	}

	/// Load every built-in template
	pub fn all_builtin() -> Result<Vec<Self>, serde_yaml::Error> {
		BUILTIN
			.iter()
			.map(|(_, text)| serde_yaml::from_str(text))
			.collect()
	}

	/// The settings block of a new pipeline
	pub fn default_settings() -> PipelineSettings {
		let mut settings = PipelineSettings::default();
		settings.security.rate_limit = Some(1000);
		settings
	}

	/// The pipeline document of a project named `project_name`
	pub fn pipeline(&self, project_name: &str) -> Result<PipelineConfig, serde_yaml::Error> {
		return Ok(PipelineConfig {
			name: project_name.to_owned(),
			version: Some("1.0.0".to_owned()),
			description: Some(self.description.clone()),
			triggers: self.triggers.clone(),
			processors: self.processors.clone(),
			outputs: self.outputs.clone(),
			settings: Self::default_settings().to_value()?,
		});
	}
}
