use thiserror::Error;

use crate::core::types::VertexId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Edge references vertex {vertex} but the graph only has {node_count} vertices")]
    VertexOutOfRange { vertex: VertexId, node_count: usize },

    #[error("Binning covers {binning} contigs but the graph has {graph}")]
    NodeCountMismatch { graph: usize, binning: usize },

    #[error("Graph has not been simplified")]
    NotSimplified,
}

/// Undirected contig connectivity graph.
///
/// Vertices are dense ids in `[0, node_count)`. Edges are recorded as given and
/// normalised by [`ContigGraph::simplify`], after which the graph has no
/// self-loops and no parallel edges and every adjacency list is sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContigGraph {
    adjacency: Vec<Vec<VertexId>>,
    simplified: bool,
}

impl Default for ContigGraph {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ContigGraph {
    /// Create a graph with `node_count` isolated vertices
    #[must_use]
    pub fn new(node_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); node_count],
            simplified: true,
        }
    }

    /// Build and simplify a graph from an edge list
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexOutOfRange` if any edge endpoint is `>= node_count`.
    pub fn from_edges<I>(node_count: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (VertexId, VertexId)>,
    {
        let mut graph = Self::new(node_count);
        for (u, v) in edges {
            graph.add_edge(u, v)?;
        }
        graph.simplify();
        Ok(graph)
    }

    /// Allocate `n` additional vertex slots
    pub fn add_vertices(&mut self, n: usize) {
        self.adjacency.resize_with(self.adjacency.len() + n, Vec::new);
    }

    /// Record an undirected edge between `u` and `v`.
    ///
    /// Self-loops and duplicates are accepted here and removed by `simplify()`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexOutOfRange` if either endpoint is not a vertex.
    pub fn add_edge(&mut self, u: VertexId, v: VertexId) -> Result<(), GraphError> {
        let node_count = self.node_count();
        for vertex in [u, v] {
            if vertex >= node_count {
                return Err(GraphError::VertexOutOfRange { vertex, node_count });
            }
        }

        self.adjacency[u].push(v);
        if u != v {
            self.adjacency[v].push(u);
        }
        self.simplified = false;
        Ok(())
    }

    /// Drop self-loops and collapse parallel edges. Idempotent.
    pub fn simplify(&mut self) {
        for (vertex, neighbors) in self.adjacency.iter_mut().enumerate() {
            neighbors.retain(|&n| n != vertex);
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        self.simplified = true;
    }

    #[must_use]
    pub fn is_simplified(&self) -> bool {
        self.simplified
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of distinct undirected edges
    #[must_use]
    pub fn edge_count(&self) -> usize {
        debug_assert!(self.simplified, "edge_count() called before simplify()");
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Distinct neighbours of `vertex`, ascending
    #[must_use]
    pub fn neighbors(&self, vertex: VertexId) -> &[VertexId] {
        debug_assert!(self.simplified, "neighbors() called before simplify()");
        &self.adjacency[vertex]
    }

    #[must_use]
    pub fn degree(&self, vertex: VertexId) -> usize {
        self.neighbors(vertex).len()
    }

    #[must_use]
    pub fn contains_edge(&self, u: VertexId, v: VertexId) -> bool {
        u < self.node_count() && self.neighbors(u).binary_search(&v).is_ok()
    }

    /// Iterate over every undirected edge once as `(u, v)` with `u < v`
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, neighbors)| {
            neighbors
                .iter()
                .copied()
                .filter(move |&v| u < v)
                .map(move |v| (u, v))
        })
    }
}
