//! # graphbin
//!
//! A library for refining metagenomic contig binning using the assembly graph.
//!
//! Binning tools group assembled contigs into putative genomes using composition
//! and coverage, and tend to leave many short contigs unbinned or misbinned.
//! Contigs that are connected in the assembly graph are likely to come from the
//! same genome, so `graphbin` uses that connectivity to correct the initial
//! binning and to extend it to contigs the binning tool could not place.
//!
//! ## Features
//!
//! - **Ambiguity filtering**: Removes labels that disagree with their neighbourhood
//! - **Label propagation**: Diffuses bin labels through the graph to unbinned contigs
//! - **Post-propagation check**: Strips labels left on bin boundaries
//! - **Assembler support**: SPAdes, SGA, MEGAHIT, Flye, Canu and Miniasm graphs
//! - **Size floor**: Optionally keeps small bins from being emptied
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphbin::parsing::{self, binning::read_initial_binning, AssemblyInputs};
//! use graphbin::{Assembler, RefineConfig, RefinementEngine};
//! use std::path::PathBuf;
//!
//! let inputs = AssemblyInputs {
//!     graph: PathBuf::from("assembly_graph_with_scaffolds.gfa"),
//!     paths: Some(PathBuf::from("contigs.paths")),
//!     contigs: None,
//! };
//! let assembly = parsing::parser_for(Assembler::Spades, &inputs)
//!     .unwrap()
//!     .parse_graph()
//!     .unwrap();
//! let bins = read_initial_binning(
//!     &PathBuf::from("initial_binning_res.csv"),
//!     ',',
//!     &assembly.contigs,
//! )
//! .unwrap();
//!
//! let engine = RefinementEngine::new(RefineConfig::default()).unwrap();
//! let result = engine.run(&assembly.graph, bins).unwrap();
//!
//! for (vertex, bin) in result.labelled() {
//!     println!("{},{bin}", assembly.contigs.name(vertex).unwrap_or_default());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Contig graph, bin assignment and contig naming
//! - [`refine`]: Ambiguity filter, reachability, label propagation and the engine
//! - [`parsing`]: Parsers for assembler graphs and initial binning results
//! - [`output`]: Writers for the refined binning and per-bin FASTA files
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod output;
pub mod parsing;
pub mod refine;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::binning::{BinAssignment, BinCatalog};
pub use crate::core::contig_names::ContigNames;
pub use crate::core::graph::ContigGraph;
pub use crate::core::types::*;
pub use crate::refine::config::RefineConfig;
pub use crate::refine::engine::{FinalBinning, RefinementEngine};
pub use crate::refine::RefineError;
