//! Command-line interface for graphbin.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **refine**: Refine an initial binning result using the assembly graph
//!
//! ## Usage
//!
//! ```text
//! # SPAdes assembly
//! graphbin refine --assembler spades \
//!     --graph assembly_graph_with_scaffolds.gfa --paths contigs.paths \
//!     --contigs contigs.fasta --binned initial_binning_res.csv --output out/
//!
//! # Long-read assembly, keeping at least 10 contigs per bin
//! graphbin refine --assembler flye --graph assembly_graph.gfa \
//!     --paths assembly_info.txt --binned bins.tsv --delimiter tab \
//!     --min-bin-count --output out/
//!
//! # JSON summary for scripting
//! graphbin --format json refine --assembler canu --graph asm.gfa \
//!     --binned bins.csv --output out/
//! ```

use clap::{Parser, Subcommand};

pub mod refine;

#[derive(Parser)]
#[command(name = "graphbin")]
#[command(version)]
#[command(about = "Refine metagenomic contig binning using the assembly graph")]
#[command(
    long_about = "graphbin refines the result of an existing contig binning tool using the connectivity of the assembly graph.\n\nIt:\n- Removes labels that disagree with their neighbourhood in the graph\n- Propagates the remaining labels to unbinned contigs\n- Writes the refined binning result and per-bin FASTA files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for the run summary
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refine an initial binning result using the assembly graph
    Refine(refine::RefineArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
