use std::fmt::Debug;

use super::{
	graph::Graph,
	util::{GraphEdgeIdx, GraphNodeIdx},
};

/// An immutable directed graph with parallel edges.
///
/// All read operations are fast.
pub struct FinalizedGraph<NodeType, EdgeType>
where
	NodeType: Debug,
	EdgeType: Debug,
{
	/// The graph data
	pub(super) graph: Graph<NodeType, EdgeType>,

	/// An array of edge idx, sorted by start node.
	/// Redundant, but makes reads faster.
	pub(super) edge_map_out: Vec<Vec<GraphEdgeIdx>>,

	/// An array of edge idx, sorted by end node.
	/// Redundant, but makes reads faster.
	pub(super) edge_map_in: Vec<Vec<GraphEdgeIdx>>,
}

impl<NodeType, EdgeType> Debug for FinalizedGraph<NodeType, EdgeType>
where
	NodeType: Debug,
	EdgeType: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FinalizedGraph")
			.field("nodes", &self.graph.nodes)
			.field("edges", &self.graph.edges)
			.finish()
	}
}

impl<NodeType, EdgeType> FinalizedGraph<NodeType, EdgeType>
where
	NodeType: Debug,
	EdgeType: Debug,
{
	/// Get a node by index
	#[inline]
	pub fn get_node(&self, node_idx: GraphNodeIdx) -> &NodeType {
		self.graph.get_node(node_idx)
	}

	/// The number of nodes in this graph
	#[inline]
	pub fn len_nodes(&self) -> usize {
		self.graph.len_nodes()
	}

	/// Iterate over all nodes this graph
	#[inline]
	pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeType> {
		self.graph.iter_nodes()
	}

	/// Iterate over all nodes in this graph, including node index
	#[inline]
	pub fn iter_nodes_idx(&self) -> impl Iterator<Item = (GraphNodeIdx, &NodeType)> {
		self.graph.iter_nodes_idx()
	}

	/// Get an edge by index
	#[inline]
	pub fn get_edge(&self, edge_idx: GraphEdgeIdx) -> (GraphNodeIdx, GraphNodeIdx, &EdgeType) {
		self.graph.get_edge(edge_idx)
	}

	/// The number of edges in this graph
	#[inline]
	pub fn len_edges(&self) -> usize {
		self.graph.len_edges()
	}

	/// Iterate over all edges in this graph
	#[inline]
	pub fn iter_edges(&self) -> impl Iterator<Item = (GraphNodeIdx, GraphNodeIdx, &EdgeType)> {
		self.graph.iter_edges()
	}

	/// Get all edges starting at the given node
	pub fn edges_starting_at(&self, node: GraphNodeIdx) -> &[GraphEdgeIdx] {
		&self.edge_map_out[usize::from(node)]
	}

	/// Get all edges ending at the given node
	pub fn edges_ending_at(&self, node: GraphNodeIdx) -> &[GraphEdgeIdx] {
		&self.edge_map_in[usize::from(node)]
	}

	/// See [`Graph::toposort`]
	pub fn toposort(&self) -> Result<Vec<GraphNodeIdx>, Vec<GraphNodeIdx>> {
		self.graph.toposort()
	}

	/// Split this graph into levels.
	///
	/// Nodes in level `n` only have incoming edges from
	/// nodes in levels `< n`. Inside a level, nodes keep
	/// their topological order. Fails like [`Graph::toposort`].
	pub fn levels(&self) -> Result<Vec<Vec<GraphNodeIdx>>, Vec<GraphNodeIdx>> {
		let order = self.toposort()?;
		let mut level_of = vec![0usize; self.len_nodes()];
		let mut levels: Vec<Vec<GraphNodeIdx>> = Vec::new();

		for node in order {
			let level = self
				.edges_ending_at(node)
				.iter()
				.map(|e| level_of[usize::from(self.get_edge(*e).0)] + 1)
				.max()
				.unwrap_or(0);
			level_of[usize::from(node)] = level;

			if levels.len() <= level {
				levels.resize_with(level + 1, Vec::new);
			}
			levels[level].push(node);
		}

		return Ok(levels);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn edge_maps() {
		let mut g: Graph<&str, ()> = Graph::new();
		let a = g.add_node("a");
		let b = g.add_node("b");
		let c = g.add_node("c");
		g.add_edge(a, b, ());
		g.add_edge(a, c, ());
		g.add_edge(b, c, ());
		let g = g.finalize();

		assert_eq!(g.edges_starting_at(a).len(), 2);
		assert_eq!(g.edges_ending_at(c).len(), 2);
		assert!(g.edges_ending_at(a).is_empty());
	}

	#[test]
	fn diamond_levels() {
		let mut g: Graph<&str, ()> = Graph::new();
		let a = g.add_node("a");
		let b = g.add_node("b");
		let c = g.add_node("c");
		let d = g.add_node("d");
		let e = g.add_node("e");
		g.add_edge(a, b, ());
		g.add_edge(a, c, ());
		g.add_edge(b, d, ());
		g.add_edge(c, d, ());
		let g = g.finalize();

		assert_eq!(g.levels().unwrap(), vec![vec![a, e], vec![b, c], vec![d]]);
	}
}
