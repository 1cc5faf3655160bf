//! MEGAHIT assembly graph parser.
//!
//! MEGAHIT graphs are converted from fastg to GFA, which names segments
//! `NODE_<n>_length_...` rather than by the contig names in `final.contigs.fa`.
//! Segments and contigs are listed in the same order, so each segment is
//! matched to the contig at the same position when their sequences are equal.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::core::contig_names::ContigKey;
use crate::parsing::fasta::{read_sequences, SequenceRecord};
use crate::parsing::gfa::{read_gfa, segment_graph, GfaRecords};
use crate::parsing::{AssemblyGraph, GraphParser, ParseError};

pub struct MegahitParser {
    graph_path: PathBuf,
    contigs_path: PathBuf,
}

impl MegahitParser {
    #[must_use]
    pub fn new(graph_path: PathBuf, contigs_path: PathBuf) -> Self {
        Self {
            graph_path,
            contigs_path,
        }
    }
}

impl GraphParser for MegahitParser {
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError> {
        let gfa = read_gfa(&self.graph_path, true)?;
        let contigs = read_sequences(&self.contigs_path)?;
        let assembly = contig_graph(&gfa, &contigs)?;

        info!(
            "MEGAHIT graph: {} contigs, {} edges",
            assembly.graph.node_count(),
            assembly.graph.edge_count()
        );
        Ok(assembly)
    }
}

/// Build the segment graph and rename each segment to its matching contig
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a link names an undeclared segment.
pub fn contig_graph(
    gfa: &GfaRecords,
    contigs: &[SequenceRecord],
) -> Result<AssemblyGraph, ParseError> {
    let mut assembly = segment_graph(gfa, ContigKey::Exact)?;

    let mut matched = 0;
    for (vertex, (segment, contig)) in gfa.segments.iter().zip(contigs).enumerate() {
        if segment.sequence.as_deref() == Some(contig.sequence.as_slice()) {
            assembly.contigs.rename(vertex, contig.name.as_str());
            matched += 1;
        }
    }

    if matched < gfa.segments.len() {
        warn!(
            "{} of {} graph segments could not be matched to a contig by sequence",
            gfa.segments.len() - matched,
            gfa.segments.len()
        );
    }
    Ok(assembly)
}
