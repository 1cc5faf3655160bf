//! Vertices eligible for label propagation.
//!
//! A vertex is eligible ("non-isolated") when its connected component holds at
//! least one labelled vertex. Components are computed once with union-find and
//! then marked, so the cost is linear in the size of the graph.

use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::core::binning::BinAssignment;
use crate::core::graph::ContigGraph;
use crate::core::types::VertexId;

/// Component label of every vertex; two vertices share a label iff connected
#[must_use]
pub fn connected_components(graph: &ContigGraph) -> Vec<usize> {
    let mut components = UnionFind::new(graph.node_count());
    for (u, v) in graph.edges() {
        components.union(u, v);
    }
    components.into_labeling()
}

/// Set of vertices reachable from at least one labelled vertex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EligibleSet {
    #[serde(skip)]
    mask: Vec<bool>,
    vertices: Vec<VertexId>,
}

impl EligibleSet {
    /// Compute the eligible set for the labels currently in `bins`
    #[must_use]
    pub fn compute(graph: &ContigGraph, bins: &BinAssignment) -> Self {
        let components = connected_components(graph);

        let mut seeded = vec![false; graph.node_count()];
        for vertex in bins.binned_vertices() {
            seeded[components[vertex]] = true;
        }

        let mask: Vec<bool> = components.iter().map(|&c| seeded[c]).collect();
        let vertices = mask
            .iter()
            .enumerate()
            .filter_map(|(vertex, &eligible)| eligible.then_some(vertex))
            .collect();

        Self { mask, vertices }
    }

    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.mask.get(vertex).copied().unwrap_or(false)
    }

    /// Eligible vertices, ascending
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}
