//! GFA (v1) segment and link records.
//!
//! Only `S` and `L` lines are interpreted; headers, paths and any other record
//! types are skipped. The reader is shared by every assembler whose graph is
//! shipped as GFA, and [`SegmentGraphParser`] builds the contig graph directly
//! for assemblers (Canu, Miniasm) whose segments are the contigs themselves.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::contig_names::{ContigKey, ContigNames};
use crate::core::graph::ContigGraph;
use crate::core::types::Assembler;
use crate::parsing::{open_text, AssemblyGraph, GraphParser, ParseError};
use crate::utils::validation::check_contig_limit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    fn parse(field: &str, line_number: usize) -> Result<Self, ParseError> {
        match field {
            "+" => Ok(Self::Forward),
            "-" => Ok(Self::Reverse),
            other => Err(ParseError::InvalidFormat(format!(
                "Line {line_number}: invalid link orientation '{other}'"
            ))),
        }
    }

    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Forward => '+',
            Self::Reverse => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    /// `None` when the sequence was `*` or not requested
    pub sequence: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub from: String,
    pub from_orient: Orientation,
    pub to: String,
    pub to_orient: Orientation,
}

#[derive(Debug, Clone, Default)]
pub struct GfaRecords {
    pub segments: Vec<Segment>,
    pub links: Vec<Link>,
}

/// Read the segments and links of a GFA file.
///
/// Segment sequences are only kept when `keep_sequences` is set.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::InvalidFormat` if an `S` or `L` line is truncated.
pub fn read_gfa(path: &Path, keep_sequences: bool) -> Result<GfaRecords, ParseError> {
    parse_gfa(open_text(path)?, keep_sequences)
}

/// Parse GFA records from any buffered reader
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if an `S` or `L` line is truncated.
pub fn parse_gfa<R: BufRead>(reader: R, keep_sequences: bool) -> Result<GfaRecords, ParseError> {
    let mut records = GfaRecords::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = idx + 1;
        let fields: Vec<&str> = line.trim_end().split('\t').collect();

        match fields[0] {
            "S" => {
                if fields.len() < 3 {
                    return Err(ParseError::InvalidFormat(format!(
                        "Line {line_number}: segment line needs a name and a sequence"
                    )));
                }
                if check_contig_limit(records.segments.len()).is_some() {
                    return Err(ParseError::TooManyContigs(records.segments.len()));
                }
                let sequence = (keep_sequences && fields[2] != "*")
                    .then(|| fields[2].as_bytes().to_vec());
                records.segments.push(Segment {
                    name: fields[1].to_string(),
                    sequence,
                });
            }
            "L" => {
                if fields.len() < 5 {
                    return Err(ParseError::InvalidFormat(format!(
                        "Line {line_number}: link line needs two segments and their orientations"
                    )));
                }
                records.links.push(Link {
                    from: fields[1].to_string(),
                    from_orient: Orientation::parse(fields[2], line_number)?,
                    to: fields[3].to_string(),
                    to_orient: Orientation::parse(fields[4], line_number)?,
                });
            }
            _ => {}
        }
    }

    debug!(
        "Read {} segments and {} links",
        records.segments.len(),
        records.links.len()
    );
    Ok(records)
}

/// Parser for GFA graphs whose segments are contigs (Canu, Miniasm)
pub struct SegmentGraphParser {
    graph_path: PathBuf,
    assembler: Assembler,
}

impl SegmentGraphParser {
    #[must_use]
    pub fn new(graph_path: PathBuf, assembler: Assembler) -> Self {
        Self {
            graph_path,
            assembler,
        }
    }
}

impl GraphParser for SegmentGraphParser {
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError> {
        let records = read_gfa(&self.graph_path, false)?;
        let assembly = segment_graph(&records, ContigKey::for_assembler(self.assembler))?;

        info!(
            "{} graph: {} contigs, {} edges",
            self.assembler,
            assembly.graph.node_count(),
            assembly.graph.edge_count()
        );
        Ok(assembly)
    }
}

/// Build a contig graph with one vertex per segment and one edge per link
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a link names an undeclared segment.
pub fn segment_graph(records: &GfaRecords, key: ContigKey) -> Result<AssemblyGraph, ParseError> {
    let mut contigs = ContigNames::new(key);
    for segment in &records.segments {
        contigs.insert(segment.name.as_str());
    }

    let mut graph = ContigGraph::new(contigs.len());
    for link in &records.links {
        let from = resolve_segment(&contigs, &link.from)?;
        let to = resolve_segment(&contigs, &link.to)?;
        if from != to {
            graph.add_edge(from, to)?;
        }
    }
    graph.simplify();

    Ok(AssemblyGraph { graph, contigs })
}

fn resolve_segment(contigs: &ContigNames, name: &str) -> Result<usize, ParseError> {
    contigs.resolve(name).ok_or_else(|| {
        ParseError::InvalidFormat(format!("Link references unknown segment '{name}'"))
    })
}
