use anyhow::{bail, Result};
use dialogchain_scaffold::scaffold::PIPELINE_FILE;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::{
	platform::{detect_platform, Platform},
	validate::report_validation,
};
use crate::{config::DialogChainConfig, status};

/// Tools DialogChain projects use, and whether we can't work without them
pub const TOOLS: [(&str, bool); 7] = [
	("docker", false),
	("curl", true),
	("python3", true),
	("go", false),
	("node", false),
	("cargo", false),
	("git", false),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DoctorError {
	#[error("`{tool}` is not installed")]
	DependencyMissing {
		tool: &'static str,
		required: bool,
		hint: String,
	},
}

/// Check every tool in [`TOOLS`].
/// Returns the tools we found and an error for each missing one.
pub fn check_tools(
	platform: &dyn Platform,
	find: impl Fn(&str) -> Option<PathBuf>,
) -> (Vec<(&'static str, PathBuf)>, Vec<DoctorError>) {
	let mut found = Vec::new();
	let mut missing = Vec::new();

	for (tool, required) in TOOLS {
		match find(tool) {
			Some(path) => found.push((tool, path)),
			None => missing.push(DoctorError::DependencyMissing {
				tool,
				required,
				hint: platform.install_hint(tool),
			}),
		}
	}

	return (found, missing);
}

pub fn run(config: &DialogChainConfig) -> Result<()> {
	let platform = detect_platform();
	status::heading("Environment");
	status::info(format!(
		"Platform: {} (package manager: {})",
		platform.name(),
		platform.package_manager().unwrap_or("none")
	));

	match config.home() {
		Some(home) if home.is_dir() => status::success(format!("Install dir: {}", home.display())),
		Some(home) => status::warning(format!("Install dir {} does not exist", home.display())),
		None => status::warning("Could not find an install dir, set DIALOGCHAIN_HOME"),
	}

	println!();
	status::heading("Tools");
	let (found, missing) = check_tools(platform.as_ref(), |t| which::which(t).ok());
	for (tool, path) in &found {
		status::success(format!("{tool}: {}", path.display()));
	}

	let mut required_missing = 0;
	for e in &missing {
		let DoctorError::DependencyMissing {
			required, hint, ..
		} = e;

		if *required {
			required_missing += 1;
			status::error(e);
		} else {
			status::warning(e);
		}
		status::detail(format!("install with: {hint}"));
	}

	let pipeline = Path::new(PIPELINE_FILE);
	if pipeline.is_file() {
		println!();
		status::heading("Pipeline");
		report_validation(pipeline);
	} else {
		debug!(message = "No pipeline in current directory, skipping validation");
	}

	println!();
	if required_missing != 0 {
		bail!("{} missing", status::count(required_missing, "required tool"));
	}

	status::success(format!(
		"{} found, {} missing",
		status::count(found.len(), "tool"),
		missing.len()
	));
	return Ok(());
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cmd::platform::Debian;

	#[test]
	fn missing_tools_get_hints() {
		let (found, missing) = check_tools(&Debian, |t| {
			(t != "go" && t != "curl").then(|| PathBuf::from(format!("/usr/bin/{t}")))
		});

		assert_eq!(found.len(), 5);
		assert_eq!(
			missing,
			vec![
				DoctorError::DependencyMissing {
					tool: "curl",
					required: true,
					hint: "sudo apt-get install -y curl".into(),
				},
				DoctorError::DependencyMissing {
					tool: "go",
					required: false,
					hint: "sudo apt-get install -y golang-go".into(),
				},
			]
		);
	}
}
