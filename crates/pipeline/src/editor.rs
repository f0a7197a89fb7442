//! Pipeline graphs drawn in the visual editor.
//!
//! The editor exports a list of nodes and a list of edges as JSON.
//! [`EditorGraph::to_yaml`] turns that export into a pipeline document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
	emit::YamlWriter,
	graph::{GraphError, ProcessorGraph},
};

/// An error we encounter while exporting an editor graph
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportError {
	/// An edge references a node that doesn't exist
	#[error("edge `{edge}` references node `{node}`, which doesn't exist")]
	NoNode { edge: String, node: String },

	/// Two nodes share an id
	#[error("node id `{id}` is used more than once")]
	DuplicateNode { id: String },

	/// Processor edges form a cycle
	#[error("processor edges have a cycle through {}", .members.join(", "))]
	HasCycle { members: Vec<String> },
}

/// Which list of the pipeline document a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	Trigger,
	Processor,
	Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorNode {
	pub id: String,
	pub kind: NodeKind,

	#[serde(rename = "type")]
	pub node_type: String,

	/// This node's property bag, as entered in the editor
	#[serde(default)]
	pub config: Map<String, Value>,
}

/// A connection drawn from `source` to `target`.
/// Between two processors, this means `target` depends on `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorEdge {
	#[serde(default)]
	pub id: Option<String>,
	pub source: String,
	pub target: String,
}

impl EditorEdge {
	fn label(&self) -> String {
		match &self.id {
			Some(id) => id.clone(),
			None => format!("{} -> {}", self.source, self.target),
		}
	}
}

/// A complete editor export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorGraph {
	#[serde(default = "EditorGraph::default_name")]
	pub name: String,

	#[serde(default = "EditorGraph::default_version")]
	pub version: String,

	#[serde(default)]
	pub description: Option<String>,

	#[serde(default)]
	pub nodes: Vec<EditorNode>,

	#[serde(default)]
	pub edges: Vec<EditorEdge>,
}

impl EditorGraph {
	fn default_name() -> String {
		"my_pipeline".to_owned()
	}

	fn default_version() -> String {
		"1.0.0".to_owned()
	}

	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Every node of the given kind, in export order
	pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &EditorNode> {
		self.nodes.iter().filter(move |n| n.kind == kind)
	}

	/// Compute the `dependencies` list of every processor.
	///
	/// A processor keeps the dependencies in its property bag,
	/// followed by the source of every processor edge that ends at it.
	pub fn processor_dependencies(&self) -> Result<HashMap<&str, Vec<String>>, ExportError> {
		let mut kinds: HashMap<&str, NodeKind> = HashMap::new();
		for n in &self.nodes {
			if kinds.insert(n.id.as_str(), n.kind).is_some() {
				return Err(ExportError::DuplicateNode { id: n.id.clone() });
			}
		}

		let mut deps: HashMap<&str, Vec<String>> = self
			.nodes_of(NodeKind::Processor)
			.map(|n| (n.id.as_str(), config_dependencies(&n.config)))
			.collect();

		for edge in &self.edges {
			for node in [&edge.source, &edge.target] {
				if !kinds.contains_key(node.as_str()) {
					return Err(ExportError::NoNode {
						edge: edge.label(),
						node: node.clone(),
					});
				}
			}

			let both_processors = kinds.get(edge.source.as_str()) == Some(&NodeKind::Processor)
				&& kinds.get(edge.target.as_str()) == Some(&NodeKind::Processor);
			if !both_processors {
				continue;
			}

			if let Some(d) = deps.get_mut(edge.target.as_str()) {
				if !d.contains(&edge.source) {
					d.push(edge.source.clone());
				}
			}
		}

		return Ok(deps);
	}

	/// Serialize this graph as a pipeline document
	pub fn to_yaml(&self) -> Result<String, ExportError> {
		let deps = self.processor_dependencies()?;
		self.check_cycles(&deps)?;

		let mut w = YamlWriter::new();
		w.write_entry(0, "name", &Value::String(self.name.clone()));
		w.write_entry(0, "version", &Value::String(self.version.clone()));
		if let Some(d) = &self.description {
			w.write_entry(0, "description", &Value::String(d.clone()));
		}

		for (key, kind) in [
			("triggers", NodeKind::Trigger),
			("processors", NodeKind::Processor),
			("outputs", NodeKind::Output),
		] {
			let mut nodes = self.nodes_of(kind).peekable();
			if nodes.peek().is_none() {
				w.write_empty_list(0, key);
				continue;
			}

			w.write_key(0, key);
			for node in nodes {
				w.write_item_entry(2, "id", &Value::String(node.id.clone()));
				w.write_entry(4, "type", &Value::String(node.node_type.clone()));

				for (k, v) in &node.config {
					let derived = kind == NodeKind::Processor && k == "dependencies";
					if k == "id" || k == "type" || derived {
						continue;
					}
					w.write_entry(4, k, v);
				}

				if let Some(d) = deps.get(node.id.as_str()).filter(|d| !d.is_empty()) {
					let d = d.iter().cloned().map(Value::String).collect();
					w.write_entry(4, "dependencies", &Value::Array(d));
				}
			}
		}

		debug!(
			message = "Exported editor graph",
			name = self.name,
			nodes = self.nodes.len(),
			edges = self.edges.len()
		);

		return Ok(w.finish());
	}

	/// Processor dependencies must form a DAG.
	/// Dependencies on unknown processors only come from hand-edited
	/// property bags; those are exported as-is.
	fn check_cycles(&self, deps: &HashMap<&str, Vec<String>>) -> Result<(), ExportError> {
		let known: HashSet<&str> = deps.keys().copied().collect();

		for (id, d) in deps {
			for dep in d.iter().filter(|x| !known.contains(x.as_str())) {
				warn!(
					message = "Processor depends on an unknown processor",
					processor = id,
					dependency = dep
				);
			}
		}

		let known = &known;
		let graph = ProcessorGraph::from_dependencies(self.nodes_of(NodeKind::Processor).map(|n| {
			let d = deps.get(n.id.as_str()).map(|x| x.as_slice()).unwrap_or(&[]);
			(
				n.id.as_str(),
				d.iter().filter(move |x| known.contains(x.as_str())),
			)
		}));

		match graph {
			Ok(_) => Ok(()),
			Err(GraphError::HasCycle { members }) => Err(ExportError::HasCycle { members }),
			Err(GraphError::DuplicateId { id }) => Err(ExportError::DuplicateNode { id }),
			Err(GraphError::UnknownDependency { .. }) => Ok(()),
		}
	}
}

/// String entries of a `dependencies` array in a property bag
fn config_dependencies(config: &Map<String, Value>) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();
	if let Some(Value::Array(a)) = config.get("dependencies") {
		for d in a.iter().filter_map(|x| x.as_str()) {
			if !out.iter().any(|x| x == d) {
				out.push(d.to_owned());
			}
		}
	}
	return out;
}
