use anyhow::{Context, Result};
use dialogchain_pipeline::plan::plan_file;
use itertools::Itertools;
use std::path::Path;

use crate::status;

/// Plan a pipeline run in `environment` and show the plan
pub fn run(file: &Path, environment: &str) -> Result<()> {
	let plan = plan_file(file, environment)
		.with_context(|| format!("could not plan {}", file.display()))?;

	status::success(format!(
		"Pipeline `{}` is valid ({} environment)",
		plan.name, plan.environment
	));

	match &plan.overrides {
		Some(p) => status::info(format!("Settings overrides from {}", p.display())),
		None => status::warning(format!(
			"No overrides for environment `{}`, using document settings",
			plan.environment
		)),
	}

	for w in &plan.warnings {
		status::warning(w);
	}

	let s = &plan.settings;
	println!();
	status::heading("Settings");
	println!(
		"  max_concurrent: {}, buffer_size: {}",
		s.performance.max_concurrent, s.performance.buffer_size
	);
	println!(
		"  monitoring: {} ({})",
		if s.monitoring.enabled { "on" } else { "off" },
		s.monitoring.log_level
	);
	println!(
		"  require_auth: {}, rate_limit: {}",
		s.security.require_auth,
		s.security
			.rate_limit
			.map(|x| format!("{x}/s"))
			.unwrap_or_else(|| "none".to_owned())
	);
	if !s.security.allowed_origins.is_empty() {
		println!("  allowed_origins: {}", s.security.allowed_origins.join(", "));
	}

	println!();
	status::heading("Plan");
	println!("  triggers: {}", plan.triggers.join(", "));
	for (i, stage) in plan.stages.iter().enumerate() {
		println!("  stage {}: {}", i + 1, stage.iter().join(", "));
	}
	println!("  outputs: {}", plan.outputs.join(", "));

	println!();
	status::detail("the pipeline runtime is not part of this toolchain, nothing was started");
	return Ok(());
}
