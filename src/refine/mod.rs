//! Graph-based refinement of an initial contig binning.
//!
//! The pipeline run by [`RefinementEngine`](engine::RefinementEngine):
//!
//! 1. **Ambiguity filter** ([`ambiguity`]): strip labels whose direct neighbours
//!    disagree, then strip labels whose nearest ring of labelled contigs disagrees
//! 2. **Reachability filter** ([`reachability`]): keep only vertices in a
//!    connected component that still holds a labelled vertex
//! 3. **Label propagation** ([`propagation`]): diffuse bin labels from the
//!    labelled vertices to the unlabelled ones
//! 4. **Post-propagation disambiguation**: re-run the direct-neighbour check
//!
//! ## Example
//!
//! ```rust
//! use graphbin::core::binning::{BinAssignment, BinCatalog};
//! use graphbin::core::graph::ContigGraph;
//! use graphbin::refine::{config::RefineConfig, engine::RefinementEngine};
//!
//! // 0 (A) - 1 (A) - 2 - 3    4 (B) - 5 (B) - 6
//! let graph = ContigGraph::from_edges(7, [(0, 1), (1, 2), (2, 3), (4, 5), (5, 6)]).unwrap();
//! let catalog = BinCatalog::from_labels(["A", "B"]);
//! let bins = BinAssignment::from_records(catalog, 7, [(0, 0), (1, 0), (4, 1), (5, 1)]).unwrap();
//!
//! let engine = RefinementEngine::new(RefineConfig::default()).unwrap();
//! let result = engine.run(&graph, bins).unwrap();
//!
//! assert_eq!(result.bins.bin_of(3), Some(0));
//! assert_eq!(result.bins.bin_of(6), Some(1));
//! ```

use thiserror::Error;

use crate::core::binning::BinningError;
use crate::core::graph::GraphError;
use crate::core::types::VertexId;

pub mod ambiguity;
pub mod config;
pub mod engine;
pub mod propagation;
pub mod reachability;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RefineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed input: {0}")]
    MalformedInput(#[from] GraphError),

    #[error(
        "Contig {vertex} is labelled with both bin '{first}' and bin '{second}'; \
         each contig must belong to only one bin"
    )]
    InconsistentLabeling {
        vertex: VertexId,
        first: String,
        second: String,
    },

    #[error("Malformed input: {0}")]
    Binning(BinningError),
}

impl From<BinningError> for RefineError {
    fn from(err: BinningError) -> Self {
        match err {
            BinningError::InconsistentLabeling {
                vertex,
                first,
                second,
            } => Self::InconsistentLabeling {
                vertex,
                first,
                second,
            },
            other => Self::Binning(other),
        }
    }
}
