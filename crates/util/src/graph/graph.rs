use petgraph::{
	algo::{tarjan_scc, toposort},
	graphmap::GraphMap,
	Directed,
};
use std::{cmp::Reverse, collections::BinaryHeap, fmt::Debug};

use super::{
	finalized::FinalizedGraph,
	util::{GraphEdgeIdx, GraphNodeIdx},
};

/// A directed graph with parallel edges.
/// Fast writes are not a goal (within reason).
///
/// [`Graph`]s are designed to be created once,
/// (possibly mutated, if creation requires multiple stages),
/// and only read afterwards.
#[derive(Debug, Clone)]
pub struct Graph<NodeType, EdgeType>
where
	NodeType: Debug,
	EdgeType: Debug,
{
	/// Array of nodes in this graph
	pub(super) nodes: Vec<NodeType>,

	/// Array of edges in this graph
	pub(super) edges: Vec<(GraphNodeIdx, GraphNodeIdx, EdgeType)>,
}

impl<NodeType, EdgeType> Graph<NodeType, EdgeType>
where
	NodeType: Debug,
	EdgeType: Debug,
{
	/// Create an empty graph
	pub fn new() -> Self {
		Self {
			nodes: Vec::new(),
			edges: Vec::new(),
		}
	}

	/// Convert this graph to an immutable structure with fast reads.
	pub fn finalize(self) -> FinalizedGraph<NodeType, EdgeType> {
		let mut edge_map_in = (0..self.nodes.len())
			.map(|_| Vec::new())
			.collect::<Vec<_>>();
		let mut edge_map_out = (0..self.nodes.len())
			.map(|_| Vec::new())
			.collect::<Vec<_>>();
		for (i, x) in self.edges.iter().enumerate() {
			edge_map_out[usize::from(x.0)].push(GraphEdgeIdx(i));
			edge_map_in[usize::from(x.1)].push(GraphEdgeIdx(i));
		}

		FinalizedGraph {
			graph: self,
			edge_map_in,
			edge_map_out,
		}
	}

	/// Add a node to this graph.
	#[inline]
	pub fn add_node(&mut self, node: NodeType) -> GraphNodeIdx {
		let i = self.nodes.len();
		self.nodes.push(node);
		GraphNodeIdx(i)
	}

	/// Get a node by index
	#[inline]
	pub fn get_node(&self, node_idx: GraphNodeIdx) -> &NodeType {
		&self.nodes[usize::from(node_idx)]
	}

	/// The number of nodes in this graph
	#[inline]
	pub fn len_nodes(&self) -> usize {
		self.nodes.len()
	}

	/// Iterate over all nodes in this graph
	#[inline]
	pub fn iter_nodes(&self) -> impl Iterator<Item = &NodeType> {
		self.nodes.iter()
	}

	/// Iterate over all nodes in this graph, including node index
	#[inline]
	pub fn iter_nodes_idx(&self) -> impl Iterator<Item = (GraphNodeIdx, &NodeType)> {
		self.iter_nodes()
			.enumerate()
			.map(|(a, b)| (GraphNodeIdx(a), b))
	}

	/// Add an edge to this graph
	#[inline]
	pub fn add_edge(
		&mut self,
		from: GraphNodeIdx,
		to: GraphNodeIdx,
		edge_value: EdgeType,
	) -> GraphEdgeIdx {
		let i = self.edges.len();
		self.edges.push((from, to, edge_value));
		GraphEdgeIdx(i)
	}

	/// Get an edge by index
	#[inline]
	pub fn get_edge(&self, edge_idx: GraphEdgeIdx) -> (GraphNodeIdx, GraphNodeIdx, &EdgeType) {
		let (f, t, e) = &self.edges[usize::from(edge_idx)];
		(*f, *t, e)
	}

	/// The number of edges in this graph
	#[inline]
	pub fn len_edges(&self) -> usize {
		self.edges.len()
	}

	/// Iterate over all edges in this graph
	#[inline]
	pub fn iter_edges(&self) -> impl Iterator<Item = (GraphNodeIdx, GraphNodeIdx, &EdgeType)> {
		self.edges.iter().map(|(f, t, e)| (*f, *t, e))
	}

	/// Node-to-node view of this graph, without parallel edges.
	fn as_graphmap(&self) -> GraphMap<usize, (), Directed> {
		let mut fake_graph = GraphMap::<usize, (), Directed>::new();
		for i in 0..self.nodes.len() {
			fake_graph.add_node(i);
		}
		for (from, to, _) in self.iter_edges() {
			fake_graph.add_edge(from.into(), to.into(), ());
		}
		fake_graph
	}

	/// Returns `true` if this graph has a cycle.
	#[inline]
	pub fn has_cycle(&self) -> bool {
		toposort(&self.as_graphmap(), None).is_err()
	}

	/// Find every node that lies on a directed cycle.
	/// Returned indices are sorted. Empty if this graph is acyclic.
	pub fn cycle_members(&self) -> Vec<GraphNodeIdx> {
		let fake_graph = self.as_graphmap();
		let mut out = Vec::new();
		for scc in tarjan_scc(&fake_graph) {
			let is_cycle = match scc.as_slice() {
				[single] => fake_graph.contains_edge(*single, *single),
				_ => true,
			};
			if is_cycle {
				out.extend(scc.into_iter().map(GraphNodeIdx));
			}
		}
		out.sort();
		return out;
	}

	/// Order nodes so that every edge points forward.
	///
	/// When several nodes are ready at once, the one that was
	/// added first comes first, so the result only depends on
	/// insertion order. Returns [`Self::cycle_members`] on failure.
	pub fn toposort(&self) -> Result<Vec<GraphNodeIdx>, Vec<GraphNodeIdx>> {
		let mut in_degree = vec![0usize; self.nodes.len()];
		let mut out_edges = vec![Vec::new(); self.nodes.len()];
		for (from, to, _) in self.iter_edges() {
			in_degree[usize::from(to)] += 1;
			out_edges[usize::from(from)].push(usize::from(to));
		}

		let mut ready: BinaryHeap<Reverse<usize>> = in_degree
			.iter()
			.enumerate()
			.filter(|(_, d)| **d == 0)
			.map(|(i, _)| Reverse(i))
			.collect();

		let mut order = Vec::with_capacity(self.nodes.len());
		while let Some(Reverse(i)) = ready.pop() {
			order.push(GraphNodeIdx(i));
			for t in &out_edges[i] {
				in_degree[*t] -= 1;
				if in_degree[*t] == 0 {
					ready.push(Reverse(*t));
				}
			}
		}

		if order.len() != self.nodes.len() {
			return Err(self.cycle_members());
		}

		return Ok(order);
	}
}
