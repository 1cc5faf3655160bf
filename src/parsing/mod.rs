//! Parsers that turn assembler output into a contig graph and an initial binning.
//!
//! This module provides parsers for:
//!
//! - **SPAdes**: `assembly_graph_with_scaffolds.gfa` + `contigs.paths`
//! - **SGA**: `.asqg` overlap graphs
//! - **MEGAHIT**: `.gfa` converted from fastg + `final.contigs.fa`
//! - **Flye**: `assembly_graph.gfa` + `assembly_info.txt`
//! - **Canu / Miniasm**: `.gfa` graphs whose segments are contigs
//! - **Initial binning**: two-column `contig,bin` files from an existing binning tool
//!
//! Every graph parser implements [`GraphParser`] and produces an
//! [`AssemblyGraph`]: a simplified [`ContigGraph`] plus the [`ContigNames`]
//! needed to translate between vertex ids and the assembler's contig names.
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphbin::core::types::Assembler;
//! use graphbin::parsing::{self, AssemblyInputs};
//! use std::path::Path;
//!
//! let inputs = AssemblyInputs {
//!     graph: Path::new("assembly_graph.gfa").to_path_buf(),
//!     paths: None,
//!     contigs: None,
//! };
//! let assembly = parsing::parser_for(Assembler::Canu, &inputs)
//!     .unwrap()
//!     .parse_graph()
//!     .unwrap();
//! let bins = parsing::binning::read_initial_binning(
//!     Path::new("initial_binning_res.csv"),
//!     ',',
//!     &assembly.contigs,
//! )
//! .unwrap();
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::binning::BinningError;
use crate::core::contig_names::ContigNames;
use crate::core::graph::{ContigGraph, GraphError};
use crate::core::types::Assembler;

pub mod binning;
pub mod fasta;
pub mod flye;
pub mod gfa;
pub mod megahit;
pub mod sga;
pub mod spades;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Contig '{0}' was not found in the assembly graph")]
    UnknownContig(String),

    #[error(
        "Contig '{contig}' is assigned to both bin '{first}' and bin '{second}'; \
         each contig in the initial binning result must belong to only one bin"
    )]
    ConflictingBins {
        contig: String,
        first: String,
        second: String,
    },

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Too many contigs: {0} exceeds maximum allowed")]
    TooManyContigs(usize),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Binning(#[from] BinningError),
}

/// A parsed assembly graph with its contig naming
#[derive(Debug, Clone)]
pub struct AssemblyGraph {
    pub graph: ContigGraph,
    pub contigs: ContigNames,
}

/// Produces an [`AssemblyGraph`] from assembler-specific files
pub trait GraphParser {
    /// Parse the input files into a simplified contig graph
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if a file cannot be read or is malformed.
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError>;
}

/// Files describing an assembly
#[derive(Debug, Clone)]
pub struct AssemblyInputs {
    /// Assembly graph (`.gfa` or `.asqg`)
    pub graph: PathBuf,
    /// Contig paths (`contigs.paths` or `assembly_info.txt`)
    pub paths: Option<PathBuf>,
    /// Contig sequences
    pub contigs: Option<PathBuf>,
}

/// Select the parser for `assembler`
///
/// # Errors
///
/// Returns `ParseError::MissingInput` if a file the assembler needs was not given.
pub fn parser_for(
    assembler: Assembler,
    inputs: &AssemblyInputs,
) -> Result<Box<dyn GraphParser>, ParseError> {
    let paths = || {
        inputs.paths.clone().ok_or_else(|| {
            ParseError::MissingInput(format!("{assembler} requires a contig paths file"))
        })
    };
    let graph = inputs.graph.clone();

    Ok(match assembler {
        Assembler::Spades => Box::new(spades::SpadesParser::new(graph, paths()?)),
        Assembler::Flye => Box::new(flye::FlyeParser::new(graph, paths()?)),
        Assembler::Sga => Box::new(sga::SgaParser::new(graph)),
        Assembler::Megahit => {
            let contigs = inputs.contigs.clone().ok_or_else(|| {
                ParseError::MissingInput(format!("{assembler} requires the contigs file"))
            })?;
            Box::new(megahit::MegahitParser::new(graph, contigs))
        }
        Assembler::Canu | Assembler::Miniasm => {
            Box::new(gfa::SegmentGraphParser::new(graph, assembler))
        }
    })
}

/// Open a text file for buffered line reading
pub(crate) fn open_text(path: &Path) -> Result<BufReader<File>, ParseError> {
    File::open(path).map(BufReader::new).map_err(|e| {
        ParseError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}

/// Read all lines of a text file
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, ParseError> {
    open_text(path)?
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(ParseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_requires_paths() {
        let inputs = AssemblyInputs {
            graph: PathBuf::from("graph.gfa"),
            paths: None,
            contigs: None,
        };
        assert!(matches!(
            parser_for(Assembler::Spades, &inputs),
            Err(ParseError::MissingInput(_))
        ));
        assert!(matches!(
            parser_for(Assembler::Megahit, &inputs),
            Err(ParseError::MissingInput(_))
        ));
        assert!(parser_for(Assembler::Canu, &inputs).is_ok());
        assert!(parser_for(Assembler::Sga, &inputs).is_ok());
    }

    #[test]
    fn test_open_missing_file_names_path() {
        let err = open_text(Path::new("/nonexistent/graph.gfa")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/graph.gfa"));
    }
}
