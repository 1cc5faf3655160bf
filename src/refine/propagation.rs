//! Harmonic-function label propagation.
//!
//! Every vertex handed to the solver carries a distribution over the bins
//! present among its seeds. Seed distributions are one-hot and never change;
//! free distributions start at zero and are replaced each iteration by the
//! degree-normalised sum of their neighbours' distributions:
//!
//! ```text
//! next[v][k] = sum over u in N(v) of dist[u][k] * w(u, v) / deg(v)
//! ```
//!
//! All edges weigh 1.0, so `deg(v)` is the neighbour count. Updates read a
//! frozen snapshot of the previous iteration and write a separate buffer, so
//! the result does not depend on vertex order.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::binning::BinAssignment;
use crate::core::graph::{ContigGraph, GraphError};
use crate::core::types::{BinIndex, VertexId};
use crate::refine::reachability::EligibleSet;
use crate::refine::RefineError;

/// Uniform edge weight of the contig graph
const EDGE_WEIGHT: f64 = 1.0;

/// How a propagation run ended
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropagationOutcome {
    /// Iterations performed
    pub iterations: usize,
    /// Summed absolute change of the last iteration
    pub diff: f64,
    /// Whether `diff` dropped below the threshold before the iteration cap
    pub converged: bool,
}

/// Label propagation solver over a subset of graph vertices
#[derive(Debug, Clone)]
pub struct LabelPropagation<'g> {
    graph: &'g ContigGraph,
    /// Solver vertices, ascending; row `i` describes `vertices[i]`
    vertices: Vec<VertexId>,
    /// Graph vertex -> row
    rows: Vec<Option<usize>>,
    /// Row -> label index of a seed, `None` for free vertices
    seeds: Vec<Option<usize>>,
    /// Label index -> bin, ascending
    labels: Vec<BinIndex>,
    /// Row-major `vertices.len() x labels.len()` distributions
    dist: Vec<f64>,
    next: Vec<f64>,
}

impl<'g> LabelPropagation<'g> {
    /// Build a solver from `(vertex, label)` records; `None` marks a free vertex.
    ///
    /// Repeated records for a vertex are merged. A vertex given two different
    /// labels is rejected before any iteration runs.
    ///
    /// # Errors
    ///
    /// Returns `RefineError::InconsistentLabeling` for conflicting labels and
    /// `RefineError::MalformedInput` for a vertex outside the graph or a graph
    /// that has not been simplified.
    pub fn new<I>(graph: &'g ContigGraph, records: I) -> Result<Self, RefineError>
    where
        I: IntoIterator<Item = (VertexId, Option<BinIndex>)>,
    {
        if !graph.is_simplified() {
            return Err(GraphError::NotSimplified.into());
        }
        let node_count = graph.node_count();
        let mut label_of: Vec<Option<Option<BinIndex>>> = vec![None; node_count];

        for (vertex, label) in records {
            let slot = label_of
                .get_mut(vertex)
                .ok_or(GraphError::VertexOutOfRange { vertex, node_count })?;
            *slot = match (*slot, label) {
                (Some(Some(first)), Some(second)) if first != second => {
                    return Err(RefineError::InconsistentLabeling {
                        vertex,
                        first: first.to_string(),
                        second: second.to_string(),
                    });
                }
                (Some(Some(existing)), _) => Some(Some(existing)),
                (_, label) => Some(label),
            };
        }

        let vertices: Vec<VertexId> = label_of
            .iter()
            .enumerate()
            .filter_map(|(vertex, label)| label.map(|_| vertex))
            .collect();

        let mut labels: Vec<BinIndex> = label_of.iter().filter_map(|l| l.flatten()).collect();
        labels.sort_unstable();
        labels.dedup();

        let mut rows = vec![None; node_count];
        let mut seeds = Vec::with_capacity(vertices.len());
        let mut dist = vec![0.0; vertices.len() * labels.len()];
        for (row, &vertex) in vertices.iter().enumerate() {
            rows[vertex] = Some(row);
            let seed = label_of[vertex]
                .flatten()
                .and_then(|bin| labels.binary_search(&bin).ok());
            if let Some(k) = seed {
                dist[row * labels.len() + k] = 1.0;
            }
            seeds.push(seed);
        }

        Ok(Self {
            graph,
            vertices,
            rows,
            seeds,
            labels,
            next: dist.clone(),
            dist,
        })
    }

    /// Build a solver over the eligible vertices, seeded with the labels in `bins`
    ///
    /// # Errors
    ///
    /// See [`LabelPropagation::new`].
    pub fn from_assignment(
        graph: &'g ContigGraph,
        bins: &BinAssignment,
        eligible: &EligibleSet,
    ) -> Result<Self, RefineError> {
        Self::new(
            graph,
            eligible
                .vertices()
                .iter()
                .map(|&vertex| (vertex, bins.bin_of(vertex))),
        )
    }

    /// Number of distinct labels among the seeds
    #[must_use]
    pub fn label_size(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn seed_count(&self) -> usize {
        self.seeds.iter().filter(|s| s.is_some()).count()
    }

    /// Current distribution of `vertex`, indexed like [`Self::labels`]
    #[must_use]
    pub fn distribution(&self, vertex: VertexId) -> Option<&[f64]> {
        let row = self.rows.get(vertex).copied().flatten()?;
        let width = self.labels.len();
        Some(&self.dist[row * width..(row + 1) * width])
    }

    /// Bins in label-index order
    #[must_use]
    pub fn labels(&self) -> &[BinIndex] {
        &self.labels
    }

    /// One synchronous update; returns the summed absolute change over free vertices
    pub fn iterate(&mut self) -> f64 {
        let width = self.labels.len();
        let mut diff = 0.0;

        for (row, &vertex) in self.vertices.iter().enumerate() {
            let out = row * width..(row + 1) * width;
            if self.seeds[row].is_some() {
                self.next[out.clone()].copy_from_slice(&self.dist[out]);
                continue;
            }

            let neighbours = self.graph.neighbors(vertex);
            #[allow(clippy::cast_precision_loss)]
            let degree = neighbours.len() as f64 * EDGE_WEIGHT;

            for k in 0..width {
                let mut value = 0.0;
                for &neighbour in neighbours {
                    if let Some(n_row) = self.rows[neighbour] {
                        value += self.dist[n_row * width + k] * (EDGE_WEIGHT / degree);
                    }
                }
                let index = row * width + k;
                diff += (value - self.dist[index]).abs();
                self.next[index] = value;
            }
        }

        std::mem::swap(&mut self.dist, &mut self.next);
        diff
    }

    /// Iterate until the change drops below `eps` or `max_iteration` is reached
    pub fn run(&mut self, eps: f64, max_iteration: usize) -> PropagationOutcome {
        let mut outcome = PropagationOutcome {
            iterations: 0,
            diff: 0.0,
            converged: false,
        };

        for iteration in 1..=max_iteration {
            let diff = self.iterate();
            debug!("Iteration {iteration}: diff = {diff}");
            outcome.iterations = iteration;
            outcome.diff = diff;
            if diff < eps {
                outcome.converged = true;
                break;
            }
        }

        info!(
            "Label propagation over {} vertices ({} labelled, {} labels): iter = {}, diff = {}",
            self.vertices.len(),
            self.seed_count(),
            self.labels.len(),
            outcome.iterations,
            outcome.diff
        );
        outcome
    }

    /// Most probable bin of every vertex with non-zero mass, ascending by vertex.
    ///
    /// Ties go to the lowest label index. Vertices never reached by diffusion
    /// are omitted.
    #[must_use]
    pub fn assignments(&self) -> Vec<(VertexId, BinIndex)> {
        let width = self.labels.len();
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(row, &vertex)| {
                let dist = &self.dist[row * width..(row + 1) * width];
                let mut best: Option<(usize, f64)> = None;
                for (k, &value) in dist.iter().enumerate() {
                    if value > best.map_or(0.0, |(_, v)| v) {
                        best = Some((k, value));
                    }
                }
                best.map(|(k, _)| (vertex, self.labels[k]))
            })
            .collect()
    }
}
