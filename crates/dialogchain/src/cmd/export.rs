use anyhow::{Context, Result};
use dialogchain_pipeline::editor::EditorGraph;
use std::path::Path;
use tracing::debug;

use crate::status;

/// Convert an editor export into a pipeline document.
/// Writes to `output` if given, otherwise to stdout.
pub fn run(graph: &Path, output: Option<&Path>) -> Result<()> {
	let text = std::fs::read_to_string(graph)
		.with_context(|| format!("could not read {}", graph.display()))?;
	let graph = EditorGraph::from_json(&text).context("invalid editor graph")?;
	debug!(
		message = "Loaded editor graph",
		nodes = graph.nodes.len(),
		edges = graph.edges.len()
	);

	let yaml = graph.to_yaml()?;

	match output {
		None => print!("{yaml}"),
		Some(path) => {
			std::fs::write(path, yaml)
				.with_context(|| format!("could not write {}", path.display()))?;
			status::success(format!("Wrote {}", path.display()));
		}
	}

	return Ok(());
}

#[cfg(test)]
mod tests {
	use super::*;
	use dialogchain_pipeline::validate::validate_file;

	#[test]
	fn export_to_file() {
		let dir = tempfile::tempdir().unwrap();
		let graph = dir.path().join("graph.json");
		let out = dir.path().join("pipeline.yaml");

		std::fs::write(
			&graph,
			r#"{
				"name": "from_editor",
				"nodes": [
					{"id": "in", "kind": "trigger", "type": "http", "config": {"port": 8080, "path": "/"}},
					{"id": "A", "kind": "processor", "type": "python", "config": {"script": "a.py"}},
					{"id": "B", "kind": "processor", "type": "python", "config": {"script": "b.py"}},
					{"id": "out", "kind": "output", "type": "file", "config": {"path": "o.log"}}
				],
				"edges": [{"source": "A", "target": "B"}]
			}"#,
		)
		.unwrap();

		run(&graph, Some(&out)).unwrap();
		let report = validate_file(&out).unwrap();
		assert_eq!(report.config.name, "from_editor");
		assert_eq!(report.order(), vec!["A", "B"]);
	}

	#[test]
	fn bad_graph() {
		let dir = tempfile::tempdir().unwrap();
		let graph = dir.path().join("graph.json");
		std::fs::write(&graph, r#"{"nodes": [], "edges": [{"source": "a", "target": "b"}]}"#)
			.unwrap();
		assert!(run(&graph, None).is_err());
	}
}
