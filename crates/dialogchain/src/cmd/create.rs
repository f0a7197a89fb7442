use anyhow::{Context, Result};
use dialogchain_scaffold::{
	project::ProjectTemplate,
	scaffold::{init, ScaffoldOptions, Scaffolder},
};
use std::path::{Path, PathBuf};

use crate::status;

pub fn create(name: &str, template: &str, parent_dir: PathBuf) -> Result<()> {
	status::info(format!(
		"Creating project {name} from template `{template}`"
	));

	let report = Scaffolder::new(ScaffoldOptions {
		name: name.to_owned(),
		template: template.to_owned(),
		parent_dir,
	})
	.create()
	.with_context(|| format!("could not create project `{name}`"))?;

	status::success(format!(
		"Created {} in {}",
		status::count(report.files.len(), "file"),
		report.root.display()
	));

	println!();
	status::heading("Next steps");
	println!("  1. cd {}", report.root.display());
	println!("  2. ./scripts/dev.sh setup");
	println!("  3. dialogchain validate pipeline.yaml");
	println!("  4. dialogchain dev pipeline.yaml");
	return Ok(());
}

/// Write a `pipeline.yaml` into `dir`
pub fn run_init(dir: &Path, name: Option<String>) -> Result<()> {
	let name = name.unwrap_or_else(|| default_name(dir));
	let path = init(dir, &name).context("could not initialize pipeline")?;
	status::success(format!("Wrote {}", path.display()));
	status::detail(format!("check it with `dialogchain validate {}`", path.display()));
	return Ok(());
}

/// The name of a directory, for pipelines that weren't given one
fn default_name(dir: &Path) -> String {
	dir.canonicalize()
		.ok()
		.and_then(|d| d.file_name().map(|x| x.to_string_lossy().into_owned()))
		.unwrap_or_else(|| "my_pipeline".to_owned())
}

pub fn list_templates() -> Result<()> {
	status::heading("Available templates");
	for t in ProjectTemplate::all_builtin()? {
		println!();
		println!("  {}  {}", t.name, t.description);
		println!(
			"      {} -> {} -> {}",
			status::count(t.triggers.len(), "trigger"),
			status::count(t.processors.len(), "processor"),
			status::count(t.outputs.len(), "output"),
		);
		if !t.services.is_empty() {
			println!("      services: {}", t.services.join(", "));
		}
		if !t.system_packages.is_empty() {
			println!("      needs: {}", t.system_packages.join(", "));
		}
	}

	println!();
	status::detail("use with `dialogchain create <name> --template <template>`");
	return Ok(());
}

/// List example pipelines, or print one
pub fn examples(name: Option<&str>) -> Result<()> {
	let Some(name) = name else {
		status::heading("Example pipelines");
		for t in ProjectTemplate::all_builtin()? {
			println!("  {:<10} {}", t.name, t.description);
		}
		println!();
		status::detail("print one with `dialogchain examples <name>`");
		return Ok(());
	};

	let template = ProjectTemplate::builtin(name)?
		.with_context(|| format!("there is no example named `{name}`"))?;
	print!(
		"{}",
		template.pipeline(&format!("{name}_example"))?.to_yaml()?
	);
	return Ok(());
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn init_uses_directory_name() {
		let dir = tempfile::tempdir().unwrap();
		let project = dir.path().join("weather_station");
		std::fs::create_dir(&project).unwrap();

		run_init(&project, None).unwrap();
		let report =
			dialogchain_pipeline::validate::validate_file(&project.join("pipeline.yaml")).unwrap();
		assert_eq!(report.config.name, "weather_station");

		assert!(run_init(&project, None).is_err());
	}
}
