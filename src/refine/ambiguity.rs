//! Detection and removal of ambiguous labels.
//!
//! A labelled vertex is *ambiguous* when the labelled contigs closest to it in
//! the assembly graph don't all share its bin. Closeness is checked in two
//! passes:
//!
//! 1. **Direct neighbours**: any binned neighbour in another bin removes the
//!    label. A vertex whose binned neighbours all agree is settled and skips
//!    pass 2.
//! 2. **Nearest labelled ring**: for vertices with no binned neighbour, a
//!    breadth-first search finds the first level containing labelled vertices;
//!    any disagreement within that level removes the label.
//!
//! Decisions within a pass are made against the assignment as it was at the
//! start of the pass; removals are applied between passes.

use tracing::debug;

use crate::core::binning::BinAssignment;
use crate::core::graph::{ContigGraph, GraphError};
use crate::core::types::{BinIndex, VertexId};
use crate::refine::RefineError;

/// Outcome of checking a vertex against its direct neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighbourVerdict {
    /// At least one binned neighbour is in a different bin
    Conflicting,
    /// Every binned neighbour shares the bin, and there is at least one
    Consistent,
    /// No neighbour carries a label
    Unlabelled,
}

/// Labels removed by one run of the filter, in decision order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbiguityReport {
    /// Removed by the direct-neighbour pass
    pub direct: Vec<VertexId>,
    /// Removed by the nearest-labelled-ring pass
    pub nearest: Vec<VertexId>,
}

impl AmbiguityReport {
    pub fn removed(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.direct.iter().chain(self.nearest.iter()).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.direct.len() + self.nearest.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.nearest.is_empty()
    }
}

/// Removal bookkeeping shared by both passes of a run.
///
/// With a size floor, a label is only scheduled for removal while
/// `bin size - removals already scheduled from that bin >= floor`.
struct RemovalSchedule {
    floor: Option<usize>,
    per_bin: Vec<usize>,
    scheduled: Vec<bool>,
}

impl RemovalSchedule {
    fn new(floor: Option<usize>, bins: &BinAssignment) -> Self {
        Self {
            floor,
            per_bin: vec![0; bins.n_bins()],
            scheduled: vec![false; bins.node_count()],
        }
    }

    fn contains(&self, vertex: VertexId) -> bool {
        self.scheduled[vertex]
    }

    fn try_schedule(&mut self, bins: &BinAssignment, vertex: VertexId, bin: BinIndex) -> bool {
        if let Some(floor) = self.floor {
            let retained = bins.members(bin).len().saturating_sub(self.per_bin[bin]);
            if retained < floor {
                return false;
            }
        }
        self.per_bin[bin] += 1;
        self.scheduled[vertex] = true;
        true
    }
}

/// Reusable visited marks for breadth-first searches
struct VisitMarks {
    marks: Vec<usize>,
    epoch: usize,
}

impl VisitMarks {
    fn new(node_count: usize) -> Self {
        Self {
            marks: vec![0; node_count],
            epoch: 0,
        }
    }

    fn reset(&mut self) {
        self.epoch += 1;
    }

    /// Mark `vertex` visited; returns `false` if it already was
    fn visit(&mut self, vertex: VertexId) -> bool {
        if self.marks[vertex] == self.epoch {
            return false;
        }
        self.marks[vertex] = self.epoch;
        true
    }
}

/// Strips labels that are inconsistent with the graph neighbourhood
pub struct AmbiguityFilter<'g> {
    graph: &'g ContigGraph,
    min_bin_count: Option<usize>,
}

impl<'g> AmbiguityFilter<'g> {
    /// # Errors
    ///
    /// Returns `RefineError::MalformedInput` if `graph` has not been simplified.
    pub fn new(
        graph: &'g ContigGraph,
        min_bin_count: Option<usize>,
    ) -> Result<Self, RefineError> {
        if !graph.is_simplified() {
            return Err(GraphError::NotSimplified.into());
        }
        Ok(Self {
            graph,
            min_bin_count,
        })
    }

    /// Run both passes, removing ambiguous labels from `bins`
    pub fn run(&self, bins: &mut BinAssignment) -> AmbiguityReport {
        let mut schedule = RemovalSchedule::new(self.min_bin_count, bins);

        // Pass 1: direct neighbours. Settled vertices skip pass 2.
        let mut settled = vec![false; bins.node_count()];
        let mut direct = Vec::new();
        for (bin, vertex) in bins.iter() {
            match self.check_neighbours(bins, vertex, bin) {
                NeighbourVerdict::Conflicting => {
                    if schedule.try_schedule(bins, vertex, bin) {
                        direct.push(vertex);
                    }
                }
                NeighbourVerdict::Consistent => settled[vertex] = true,
                NeighbourVerdict::Unlabelled => {}
            }
        }
        for &vertex in &direct {
            bins.unassign(vertex);
        }
        debug!("Direct-neighbour pass removed {} labels", direct.len());

        // Pass 2: nearest labelled ring, against the post-pass-1 labels
        let mut marks = VisitMarks::new(bins.node_count());
        let mut nearest = Vec::new();
        for (bin, vertex) in bins.iter() {
            if settled[vertex] || schedule.contains(vertex) {
                continue;
            }
            let closest = self.closest_labelled(bins, vertex, &mut marks);
            let disagrees = closest.iter().any(|&n| bins.bin_of(n) != Some(bin));
            if disagrees && schedule.try_schedule(bins, vertex, bin) {
                nearest.push(vertex);
            }
        }
        for &vertex in &nearest {
            bins.unassign(vertex);
        }
        debug!("Nearest-labelled pass removed {} labels", nearest.len());

        AmbiguityReport { direct, nearest }
    }

    /// Run only the direct-neighbour pass, removing conflicting labels
    pub fn run_direct(&self, bins: &mut BinAssignment) -> Vec<VertexId> {
        let mut schedule = RemovalSchedule::new(self.min_bin_count, bins);
        let mut removed = Vec::new();
        for (bin, vertex) in bins.iter() {
            if self.check_neighbours(bins, vertex, bin) == NeighbourVerdict::Conflicting
                && schedule.try_schedule(bins, vertex, bin)
            {
                removed.push(vertex);
            }
        }
        for &vertex in &removed {
            bins.unassign(vertex);
        }
        removed
    }

    /// Compare `vertex`'s bin with the bins of its direct neighbours
    #[must_use]
    pub fn check_neighbours(
        &self,
        bins: &BinAssignment,
        vertex: VertexId,
        bin: BinIndex,
    ) -> NeighbourVerdict {
        let mut any_binned = false;
        for &neighbour in self.graph.neighbors(vertex) {
            match bins.bin_of(neighbour) {
                Some(other) if other != bin => return NeighbourVerdict::Conflicting,
                Some(_) => any_binned = true,
                None => {}
            }
        }
        if any_binned {
            NeighbourVerdict::Consistent
        } else {
            NeighbourVerdict::Unlabelled
        }
    }

    /// All labelled vertices at the smallest graph distance (>= 1) from
    /// `vertex`, ascending. Empty if no labelled vertex is reachable.
    #[must_use]
    pub fn nearest_labelled(&self, bins: &BinAssignment, vertex: VertexId) -> Vec<VertexId> {
        let mut marks = VisitMarks::new(bins.node_count());
        self.closest_labelled(bins, vertex, &mut marks)
    }

    fn closest_labelled(
        &self,
        bins: &BinAssignment,
        vertex: VertexId,
        marks: &mut VisitMarks,
    ) -> Vec<VertexId> {
        marks.reset();
        marks.visit(vertex);

        let mut frontier: Vec<VertexId> = self
            .graph
            .neighbors(vertex)
            .iter()
            .copied()
            .filter(|&n| marks.visit(n))
            .collect();

        while !frontier.is_empty() {
            let mut hits: Vec<VertexId> = frontier
                .iter()
                .copied()
                .filter(|&n| bins.is_binned(n))
                .collect();
            if !hits.is_empty() {
                hits.sort_unstable();
                return hits;
            }

            let mut next = Vec::new();
            for &current in &frontier {
                for &neighbour in self.graph.neighbors(current) {
                    if marks.visit(neighbour) {
                        next.push(neighbour);
                    }
                }
            }
            frontier = next;
        }

        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binning::BinCatalog;

    fn assignment(node_count: usize, records: &[(VertexId, BinIndex)]) -> BinAssignment {
        let catalog = BinCatalog::from_labels(["A", "B"]);
        BinAssignment::from_records(catalog, node_count, records.iter().copied()).unwrap()
    }

    #[test]
    fn test_conflicting_direct_neighbours_removed() {
        // 0 (A) is surrounded by B; 3 (B) only touches B
        let graph = ContigGraph::from_edges(4, [(0, 1), (0, 2), (1, 3)]).unwrap();
        let mut bins = assignment(4, &[(0, 0), (1, 1), (2, 1), (3, 1)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        // The B side of each conflicting edge goes too
        assert_eq!(report.direct, vec![0, 1, 2]);
        assert!(report.nearest.is_empty());
        assert_eq!(bins.bin_of(0), None);
        assert_eq!(bins.bin_of(3), Some(1));
    }

    #[test]
    fn test_both_sides_of_a_disagreeing_edge_removed() {
        let graph = ContigGraph::from_edges(2, [(0, 1)]).unwrap();
        let mut bins = assignment(2, &[(0, 0), (1, 1)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        assert_eq!(report.direct, vec![0, 1]);
        assert_eq!(bins.assigned_count(), 0);
    }

    #[test]
    fn test_consistent_ring_at_distance_two_retained() {
        // 2 (A) - 1 - 0 (A) - 3 - 4 (A)
        let graph = ContigGraph::from_edges(5, [(0, 1), (1, 2), (0, 3), (3, 4)]).unwrap();
        let mut bins = assignment(5, &[(0, 0), (2, 0), (4, 0)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        assert!(report.is_empty());
        assert_eq!(bins.bin_of(0), Some(0));
    }

    #[test]
    fn test_disagreeing_ring_removes_label() {
        // 2 (A) - 1 - 0 (A) - 3 - 4 (B)
        let graph = ContigGraph::from_edges(5, [(0, 1), (1, 2), (0, 3), (3, 4)]).unwrap();
        let mut bins = assignment(5, &[(0, 0), (2, 0), (4, 1)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        // Every vertex sees the others two hops away; 0's ring holds both bins,
        // 2's nearest ring is {0}, 4's nearest ring is {0}
        assert_eq!(report.direct, Vec::<VertexId>::new());
        assert_eq!(report.nearest, vec![0, 4]);
        assert_eq!(bins.bin_of(2), Some(0));
    }

    #[test]
    fn test_settled_vertices_skip_second_pass() {
        // 0 (A) - 1 (A) - 2 - 3 (B): 1 is settled by its neighbour 0,
        // 3's nearest ring is {1} so it is removed
        let graph = ContigGraph::from_edges(4, [(0, 1), (1, 2), (2, 3)]).unwrap();
        let mut bins = assignment(4, &[(0, 0), (1, 0), (3, 1)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        assert_eq!(report.nearest, vec![3]);
        assert_eq!(bins.bin_of(0), Some(0));
        assert_eq!(bins.bin_of(1), Some(0));
    }

    #[test]
    fn test_isolated_vertex_untouched() {
        let graph = ContigGraph::new(1);
        let mut bins = assignment(1, &[(0, 0)]);

        let report = AmbiguityFilter::new(&graph, None).unwrap().run(&mut bins);

        assert!(report.is_empty());
        assert_eq!(bins.bin_of(0), Some(0));
    }

    #[test]
    fn test_size_floor_blocks_removal() {
        let graph = ContigGraph::from_edges(2, [(0, 1)]).unwrap();
        let mut bins = assignment(2, &[(0, 0), (1, 1)]);

        let report = AmbiguityFilter::new(&graph, Some(10)).unwrap().run(&mut bins);

        assert!(report.is_empty());
        assert_eq!(bins.assigned_count(), 2);
    }

    #[test]
    fn test_size_floor_counts_scheduled_removals() {
        // Bin A has 3 members, all adjacent to B; floor 2 lets two of them go
        let graph = ContigGraph::from_edges(4, [(0, 3), (1, 3), (2, 3)]).unwrap();
        let mut bins = assignment(4, &[(0, 0), (1, 0), (2, 0), (3, 1)]);

        let removed = AmbiguityFilter::new(&graph, Some(2))
            .unwrap()
            .run_direct(&mut bins);

        // 3 sits alone in B (size 1 < 2) and is kept
        assert_eq!(removed, vec![0, 1]);
        assert_eq!(bins.bin_of(2), Some(0));
        assert_eq!(bins.bin_of(3), Some(1));
    }

    #[test]
    fn test_nearest_labelled_levels() {
        // 0 - 1 - 2 (A), 0 - 3 - 4 (B), 0 - 5 - 6 - 7 (A)
        let graph =
            ContigGraph::from_edges(8, [(0, 1), (1, 2), (0, 3), (3, 4), (0, 5), (5, 6), (6, 7)])
                .unwrap();
        let bins = assignment(8, &[(2, 0), (4, 1), (7, 0)]);
        let filter = AmbiguityFilter::new(&graph, None).unwrap();

        assert_eq!(filter.nearest_labelled(&bins, 0), vec![2, 4]);
        assert_eq!(filter.nearest_labelled(&bins, 6), vec![7]);
        assert_eq!(
            filter.check_neighbours(&bins, 1, 0),
            NeighbourVerdict::Consistent
        );
        assert_eq!(
            filter.check_neighbours(&bins, 0, 0),
            NeighbourVerdict::Unlabelled
        );
    }

    #[test]
    fn test_nearest_labelled_unreachable() {
        let graph = ContigGraph::from_edges(3, [(0, 1)]).unwrap();
        let bins = assignment(3, &[(2, 0)]);
        let filter = AmbiguityFilter::new(&graph, None).unwrap();
        assert!(filter.nearest_labelled(&bins, 0).is_empty());
    }

    #[test]
    fn test_unsimplified_graph_rejected() {
        let mut graph = ContigGraph::new(2);
        graph.add_edge(0, 1).unwrap();
        assert!(matches!(
            AmbiguityFilter::new(&graph, None),
            Err(RefineError::MalformedInput(GraphError::NotSimplified))
        ));

        graph.simplify();
        assert!(AmbiguityFilter::new(&graph, None).is_ok());
    }
}
