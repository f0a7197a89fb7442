//! The processor dependency graph

use dialogchain_util::graph::{finalized::FinalizedGraph, graph::Graph, util::GraphNodeIdx};
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

use crate::schema::Processor;

/// An error we encounter while building a [`ProcessorGraph`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
	/// Two processors share an id
	#[error("processor id `{id}` is used more than once")]
	DuplicateId { id: String },

	/// A processor depends on a processor that doesn't exist
	#[error("processor `{processor}` depends on `{dependency}`, which doesn't exist")]
	UnknownDependency {
		processor: String,
		dependency: String,
	},

	/// Processor dependencies have a cycle
	#[error("processor dependencies have a cycle through {}", .members.join(", "))]
	HasCycle {
		/// Every processor that lies on a cycle
		members: Vec<String>,
	},
}

/// Processors and the "must run before" relation between them.
///
/// An edge `a -> b` means `b` depends on `a`.
/// A [`ProcessorGraph`] is guaranteed to be acyclic.
#[derive(Debug)]
pub struct ProcessorGraph {
	graph: FinalizedGraph<String, ()>,
	id_map: HashMap<String, GraphNodeIdx>,

	/// Topological order, computed once
	order: Vec<GraphNodeIdx>,

	/// Dependency levels, computed once
	stages: Vec<Vec<GraphNodeIdx>>,
}

impl ProcessorGraph {
	/// Build the dependency graph of a pipeline's processors
	pub fn from_processors(processors: &[Processor]) -> Result<Self, GraphError> {
		Self::from_dependencies(
			processors
				.iter()
				.map(|p| (p.id.as_str(), p.dependencies.as_slice())),
		)
	}

	/// Build a dependency graph from `(id, dependencies)` pairs.
	/// Duplicate entries in one dependency list are ignored.
	pub fn from_dependencies<'a, I, D>(items: I) -> Result<Self, GraphError>
	where
		I: IntoIterator<Item = (&'a str, D)>,
		D: IntoIterator<Item = &'a String>,
	{
		let mut graph = Graph::new();
		let mut id_map = HashMap::new();
		let mut deps = Vec::new();

		for (id, d) in items {
			if id_map.contains_key(id) {
				return Err(GraphError::DuplicateId { id: id.to_owned() });
			}
			let n = graph.add_node(id.to_owned());
			id_map.insert(id.to_owned(), n);
			deps.push((n, d));
		}

		for (n, d) in deps {
			let mut seen = Vec::new();
			for dep in d {
				if seen.contains(&dep) {
					continue;
				}
				seen.push(dep);

				let from = id_map
					.get(dep.as_str())
					.ok_or_else(|| GraphError::UnknownDependency {
						processor: graph.get_node(n).clone(),
						dependency: dep.clone(),
					})?;
				graph.add_edge(*from, n, ());
			}
		}

		let graph = graph.finalize();
		let order = graph.toposort().map_err(|members| GraphError::HasCycle {
			members: members
				.into_iter()
				.map(|x| graph.get_node(x).clone())
				.collect(),
		})?;

		// This can't fail, we just checked for cycles
		let stages = graph.levels().unwrap_or_default();

		trace!(
			message = "Built processor graph",
			processors = graph.len_nodes(),
			edges = graph.len_edges(),
			stages = stages.len()
		);

		return Ok(Self {
			graph,
			id_map,
			order,
			stages,
		});
	}

	/// The number of processors in this graph
	pub fn len(&self) -> usize {
		self.graph.len_nodes()
	}

	pub fn is_empty(&self) -> bool {
		self.graph.len_nodes() == 0
	}

	/// Processor ids in an order that runs every processor after
	/// all of its dependencies. Ties keep document order.
	pub fn topological_order(&self) -> Vec<&str> {
		self.order
			.iter()
			.map(|x| self.graph.get_node(*x).as_str())
			.collect()
	}

	/// Processors grouped into stages.
	/// Processors in one stage only depend on earlier stages,
	/// so they may run side by side.
	pub fn stages(&self) -> Vec<Vec<&str>> {
		self.stages
			.iter()
			.map(|s| s.iter().map(|x| self.graph.get_node(*x).as_str()).collect())
			.collect()
	}

	/// The processors `id` directly depends on.
	/// `None` if there is no such processor.
	pub fn dependencies_of(&self, id: &str) -> Option<Vec<&str>> {
		let n = self.id_map.get(id)?;
		Some(
			self.graph
				.edges_ending_at(*n)
				.iter()
				.map(|e| self.graph.get_node(self.graph.get_edge(*e).0).as_str())
				.collect(),
		)
	}

	/// The processors that directly depend on `id`.
	/// `None` if there is no such processor.
	pub fn dependents_of(&self, id: &str) -> Option<Vec<&str>> {
		let n = self.id_map.get(id)?;
		Some(
			self.graph
				.edges_starting_at(*n)
				.iter()
				.map(|e| self.graph.get_node(self.graph.get_edge(*e).1).as_str())
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn build(items: &[(&str, &[&str])]) -> Result<ProcessorGraph, GraphError> {
		let owned: Vec<(&str, Vec<String>)> = items
			.iter()
			.map(|(id, d)| (*id, d.iter().map(|x| (*x).to_owned()).collect()))
			.collect();
		ProcessorGraph::from_dependencies(owned.iter().map(|(id, d)| (*id, d.iter())))
	}

	#[test]
	fn order_follows_dependencies() {
		let g = build(&[
			("report", &["analyze"]),
			("detect", &[]),
			("analyze", &["detect"]),
		])
		.unwrap();
		assert_eq!(g.topological_order(), vec!["detect", "analyze", "report"]);
		assert_eq!(g.stages(), vec![vec!["detect"], vec!["analyze"], vec!["report"]]);
		assert_eq!(g.dependencies_of("analyze"), Some(vec!["detect"]));
		assert_eq!(g.dependents_of("detect"), Some(vec!["analyze"]));
		assert_eq!(g.dependencies_of("nope"), None);
	}

	#[test]
	fn independent_processors_share_a_stage() {
		let g = build(&[("a", &[]), ("b", &[]), ("c", &["a", "b", "a"])]).unwrap();
		assert_eq!(g.stages(), vec![vec!["a", "b"], vec!["c"]]);
		assert_eq!(g.dependencies_of("c"), Some(vec!["a", "b"]));
	}

	#[test]
	fn unknown_dependency() {
		let e = build(&[("a", &["ghost"])]).unwrap_err();
		assert_eq!(
			e,
			GraphError::UnknownDependency {
				processor: "a".into(),
				dependency: "ghost".into()
			}
		);
	}

	#[test]
	fn duplicate_id() {
		let e = build(&[("a", &[]), ("a", &[])]).unwrap_err();
		assert_eq!(e, GraphError::DuplicateId { id: "a".into() });
	}

	#[test]
	fn cycle_is_an_error() {
		let e = build(&[("x", &[]), ("a", &["c"]), ("b", &["a"]), ("c", &["b"])]).unwrap_err();
		assert_eq!(
			e,
			GraphError::HasCycle {
				members: vec!["a".into(), "b".into(), "c".into()]
			}
		);
		assert!(e.to_string().contains("a, b, c"));
	}

	#[test]
	fn self_dependency_is_a_cycle() {
		let e = build(&[("a", &["a"])]).unwrap_err();
		assert!(matches!(e, GraphError::HasCycle { .. }));
	}
}
