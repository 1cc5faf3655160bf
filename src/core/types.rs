use serde::{Deserialize, Serialize};

/// Dense vertex identifier in `[0, node_count)`
pub type VertexId = usize;

/// 0-based index into the bin catalog
pub type BinIndex = usize;

/// Minimum number of labels a bin retains when the size-floor guard is enabled
pub const MIN_BIN_COUNT: usize = 10;

/// Default iteration cap for label propagation
pub const DEFAULT_MAX_ITERATION: usize = 100;

/// Default convergence threshold for label propagation
pub const DEFAULT_DIFF_THRESHOLD: f64 = 0.1;

/// Convergence threshold used by earlier releases
pub const LEGACY_DIFF_THRESHOLD: f64 = 1e-5;

/// Assembler that produced the assembly graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Assembler {
    Spades,
    Sga,
    Megahit,
    Flye,
    Canu,
    Miniasm,
}

impl Assembler {
    /// Whether a contig paths file (`--paths`) is needed to build the graph
    #[must_use]
    pub fn requires_paths(self) -> bool {
        matches!(self, Self::Spades | Self::Flye)
    }

    /// Whether the original contigs file (`--contigs`) is needed to build the graph
    #[must_use]
    pub fn requires_contigs(self) -> bool {
        matches!(self, Self::Megahit)
    }
}

impl std::fmt::Display for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spades => write!(f, "SPAdes"),
            Self::Sga => write!(f, "SGA"),
            Self::Megahit => write!(f, "MEGAHIT"),
            Self::Flye => write!(f, "Flye"),
            Self::Canu => write!(f, "Canu"),
            Self::Miniasm => write!(f, "Miniasm"),
        }
    }
}
