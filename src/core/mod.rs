//! Core data types for graph-based bin refinement.
//!
//! This module provides the fundamental types used throughout the library:
//!
//! - [`ContigGraph`](graph::ContigGraph): Undirected, simplified contig connectivity graph
//! - [`BinCatalog`](binning::BinCatalog): Sorted catalog of bin labels
//! - [`BinAssignment`](binning::BinAssignment): Mutually exclusive vertex-to-bin partition
//! - [`ContigNames`](contig_names::ContigNames): Vertex id <-> contig name mapping
//! - [`Assembler`](types::Assembler), [`VertexId`](types::VertexId): Shared types and constants
//!
//! ## Contig Naming
//!
//! Assemblers name contigs differently and binning tools don't always echo the
//! full name back:
//!
//! | Assembler | Graph name | Lookup key |
//! |-----------|------------|------------|
//! | SPAdes    | NODE_12_length_5000_cov_3.2 | 12 |
//! | SGA       | contig-12  | 12 |
//! | MEGAHIT   | k141_12    | k141_12 |
//! | Flye      | contig_12  | contig_12 |
//! | Canu      | tig00000012 | tig00000012 |
//! | Miniasm   | utg000012l | utg000012l |
//!
//! The refinement engine itself only ever sees dense vertex ids.

pub mod binning;
pub mod contig_names;
pub mod graph;
pub mod types;
