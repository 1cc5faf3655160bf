use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::core::binning::BinAssignment;
use crate::core::graph::{ContigGraph, GraphError};
use crate::core::types::{BinIndex, VertexId};
use crate::refine::ambiguity::AmbiguityFilter;
use crate::refine::config::RefineConfig;
use crate::refine::propagation::{LabelPropagation, PropagationOutcome};
use crate::refine::reachability::EligibleSet;
use crate::refine::RefineError;

/// Vertices whose label was stripped, by stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemovedLabels {
    /// Removed by the ambiguity filter before propagation
    pub before_propagation: BTreeSet<VertexId>,
    /// Removed by the disambiguation pass after propagation
    pub after_propagation: BTreeSet<VertexId>,
}

impl RemovedLabels {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before_propagation.is_empty() && self.after_propagation.is_empty()
    }
}

/// Counters collected while refining
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefineStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub n_bins: usize,
    pub initially_binned: usize,
    pub removed_direct: usize,
    pub removed_nearest: usize,
    pub eligible: usize,
    pub propagated: usize,
    pub removed_after_propagation: usize,
    pub finally_binned: usize,
}

/// Result of a refinement run
#[derive(Debug, Clone)]
pub struct FinalBinning {
    /// Surviving and propagated labels
    pub bins: BinAssignment,
    /// Labels stripped by the filters
    pub removed: RemovedLabels,
    /// Vertices considered reachable from a labelled vertex
    pub eligible: EligibleSet,
    /// `None` when there was nothing to propagate
    pub propagation: Option<PropagationOutcome>,
    pub stats: RefineStats,
}

impl FinalBinning {
    /// Vertices without a final label, ascending
    pub fn unbinned(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.bins.unbinned_vertices()
    }

    /// Vertices in components without any label, ascending
    pub fn isolated(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.bins.node_count()).filter(|&v| !self.eligible.contains(v))
    }

    /// `(vertex, bin label)` for every labelled vertex, in bin order
    pub fn labelled(&self) -> impl Iterator<Item = (VertexId, &str)> + '_ {
        let catalog = self.bins.catalog();
        self.bins
            .iter()
            .filter_map(move |(bin, vertex)| catalog.label(bin).map(|label| (vertex, label)))
    }

    #[must_use]
    pub fn bin_of(&self, vertex: VertexId) -> Option<BinIndex> {
        self.bins.bin_of(vertex)
    }
}

/// Runs the full refinement pipeline
#[derive(Debug, Clone)]
pub struct RefinementEngine {
    config: RefineConfig,
}

impl RefinementEngine {
    /// Create an engine, validating the configuration up front
    ///
    /// # Errors
    ///
    /// Returns `RefineError::InvalidConfiguration` for an unusable configuration.
    pub fn new(config: RefineConfig) -> Result<Self, RefineError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &RefineConfig {
        &self.config
    }

    /// Refine `bins` using the connectivity of `graph`.
    ///
    /// # Errors
    ///
    /// Returns `RefineError::MalformedInput` if the graph and binning disagree on
    /// the number of contigs and `RefineError::InconsistentLabeling` if a contig
    /// ends up with two labels.
    pub fn run(
        &self,
        graph: &ContigGraph,
        mut bins: BinAssignment,
    ) -> Result<FinalBinning, RefineError> {
        if graph.node_count() != bins.node_count() {
            return Err(GraphError::NodeCountMismatch {
                graph: graph.node_count(),
                binning: bins.node_count(),
            }
            .into());
        }

        let graph = if graph.is_simplified() {
            Cow::Borrowed(graph)
        } else {
            let mut owned = graph.clone();
            owned.simplify();
            Cow::Owned(owned)
        };
        let graph = graph.as_ref();

        let mut stats = RefineStats {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            n_bins: bins.n_bins(),
            initially_binned: bins.assigned_count(),
            ..RefineStats::default()
        };
        let mut removed = RemovedLabels::default();
        let filter = AmbiguityFilter::new(graph, self.config.min_bin_count)?;

        info!("Determining ambiguous vertices");
        let report = filter.run(&mut bins);
        stats.removed_direct = report.direct.len();
        stats.removed_nearest = report.nearest.len();
        removed.before_propagation.extend(report.removed());
        info!(
            "Removed labels of {} ambiguous vertices ({} by direct neighbours, {} by nearest labelled vertices)",
            report.len(),
            report.direct.len(),
            report.nearest.len()
        );

        info!("Determining vertices which are not isolated and not in components without any labels");
        let eligible = EligibleSet::compute(graph, &bins);
        stats.eligible = eligible.len();
        info!("Number of non-isolated contigs: {}", eligible.len());

        let mut solver = LabelPropagation::from_assignment(graph, &bins, &eligible)?;
        let propagation = if solver.label_size() == 0 {
            debug!("No labelled vertices left; skipping label propagation");
            None
        } else {
            info!(
                "Starting label propagation with eps={} and max_iteration={}",
                self.config.diff_threshold, self.config.max_iteration
            );
            Some(solver.run(self.config.diff_threshold, self.config.max_iteration))
        };

        for (vertex, bin) in solver.assignments() {
            if !bins.is_binned(vertex) {
                bins.assign(vertex, bin)?;
                stats.propagated += 1;
            }
        }
        info!("Label propagation assigned {} contigs", stats.propagated);

        info!("Determining ambiguous vertices after propagation");
        let stripped = filter.run_direct(&mut bins);
        stats.removed_after_propagation = stripped.len();
        removed.after_propagation.extend(stripped);
        info!(
            "Removed labels of {} ambiguous vertices",
            stats.removed_after_propagation
        );

        stats.finally_binned = bins.assigned_count();
        Ok(FinalBinning {
            bins,
            removed,
            eligible,
            propagation,
            stats,
        })
    }
}
