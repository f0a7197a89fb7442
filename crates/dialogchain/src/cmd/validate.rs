use anyhow::{bail, Result};
use dialogchain_pipeline::{
	graph::GraphError,
	validate::{validate_file, ValidateError},
};
use itertools::Itertools;
use std::path::Path;

use crate::status;

pub fn run(file: &Path) -> Result<()> {
	if !report_validation(file) {
		bail!("{} is invalid", file.display());
	}
	return Ok(());
}

/// Validate `file` and print what we find.
/// Returns `true` if the file is valid.
pub fn report_validation(file: &Path) -> bool {
	status::info(format!("Validating {}", file.display()));

	let report = match validate_file(file) {
		Ok(x) => x,
		Err(err) => {
			let errors = print_error(&err);
			status::info(format!(
				"{}, {}",
				status::count(errors, "error"),
				status::count(0, "warning")
			));
			return false;
		}
	};

	let c = &report.config;
	status::success("YAML syntax is valid");
	status::success("All required keys are present");
	status::success(format!(
		"{}, {}, {}",
		status::count(c.triggers.len(), "trigger"),
		status::count(c.processors.len(), "processor"),
		status::count(c.outputs.len(), "output"),
	));

	if !report.graph.is_empty() {
		status::success(format!(
			"Processor order: {}",
			report.order().iter().join(" -> ")
		));
	}

	for w in &report.warnings {
		status::warning(w);
	}

	status::info(format!(
		"{}, {}",
		status::count(0, "error"),
		status::count(report.warnings.len(), "warning")
	));
	return true;
}

/// Print `err`, returning the number of errors we printed
fn print_error(err: &ValidateError) -> usize {
	match err {
		ValidateError::SchemaError { missing } => {
			status::success("YAML syntax is valid");
			for key in missing {
				status::error(format!("Missing required key: {key}"));
			}
			return missing.len();
		}

		ValidateError::ParseError(e) => {
			status::error("Invalid YAML syntax");
			status::detail(e);
		}

		ValidateError::InvalidStructure(e) => {
			status::error("Invalid pipeline structure");
			status::detail(e);
		}

		ValidateError::Graph(GraphError::HasCycle { members }) => {
			status::error(format!(
				"Processor dependencies have a cycle: {}",
				members.join(", ")
			));
		}

		e => status::error(e),
	}

	return 1;
}
