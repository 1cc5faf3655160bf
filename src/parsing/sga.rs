//! SGA overlap graph (`.asqg`) parser.
//!
//! Vertices come from `VT` lines (`VT<TAB>contig-<n><TAB><sequence>`) and edges
//! from `ED` lines, whose second field starts with the two overlapping contig
//! names: `ED<TAB>contig-1 contig-7 0 99 100 0 99 200 1 0`.

use std::io::BufRead;
use std::path::PathBuf;

use tracing::info;

use crate::core::contig_names::{ContigKey, ContigNames};
use crate::core::graph::ContigGraph;
use crate::parsing::{open_text, AssemblyGraph, GraphParser, ParseError};
use crate::utils::validation::check_contig_limit;

pub struct SgaParser {
    graph_path: PathBuf,
}

impl SgaParser {
    #[must_use]
    pub fn new(graph_path: PathBuf) -> Self {
        Self { graph_path }
    }
}

impl GraphParser for SgaParser {
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError> {
        let assembly = parse_asqg(open_text(&self.graph_path)?)?;
        info!(
            "SGA graph: {} contigs, {} edges",
            assembly.graph.node_count(),
            assembly.graph.edge_count()
        );
        Ok(assembly)
    }
}

/// Parse an ASQG overlap graph
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a `VT` or `ED` line is truncated or an
/// edge names an undeclared contig.
pub fn parse_asqg<R: BufRead>(reader: R) -> Result<AssemblyGraph, ParseError> {
    let mut contigs = ContigNames::new(ContigKey::SgaContig);
    let mut overlaps = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let mut fields = line.split('\t');
        let record_type = fields.next().unwrap_or_default();
        let invalid = |what: &str| {
            ParseError::InvalidFormat(format!("Line {}: {what}", idx + 1))
        };

        match record_type {
            "VT" => {
                let name = fields
                    .next()
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| invalid("vertex line has no contig name"))?;
                if check_contig_limit(contigs.len()).is_some() {
                    return Err(ParseError::TooManyContigs(contigs.len()));
                }
                contigs.insert(name);
            }
            "ED" => {
                let mut names = fields.next().unwrap_or_default().split_whitespace();
                match (names.next(), names.next()) {
                    (Some(a), Some(b)) => overlaps.push((a.to_string(), b.to_string())),
                    _ => return Err(invalid("edge line needs two contig names")),
                }
            }
            _ => {}
        }
    }

    let mut graph = ContigGraph::new(contigs.len());
    for (a, b) in &overlaps {
        let resolve = |name: &str| {
            contigs.resolve(name).ok_or_else(|| {
                ParseError::InvalidFormat(format!("Edge references unknown contig '{name}'"))
            })
        };
        let (u, v) = (resolve(a)?, resolve(b)?);
        if u != v {
            graph.add_edge(u, v)?;
        }
    }
    graph.simplify();

    Ok(AssemblyGraph { graph, contigs })
}
