//! Flye assembly graph parser.
//!
//! Flye reports each contig's path through the repeat graph in the last column
//! of `assembly_info.txt`:
//!
//! ```text
//! #seq_name  length  cov.  circ.  repeat  mult.  alt_group  graph_path
//! contig_1   48211   31    N      N       1      *          12,-7,*,3
//! ```
//!
//! Graph edges are GFA segments named `edge_<n>`; a leading `-` in a path marks
//! the reverse strand and `*` marks a gap. Two contigs are adjacent when they
//! share a graph edge or when one of their graph edges is linked to one of the
//! other's.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::contig_names::{ContigKey, ContigNames};
use crate::core::graph::ContigGraph;
use crate::core::types::VertexId;
use crate::parsing::gfa::{read_gfa, GfaRecords, Link, Orientation};
use crate::parsing::{read_lines, AssemblyGraph, GraphParser, ParseError};
use crate::utils::validation::check_contig_limit;

pub struct FlyeParser {
    graph_path: PathBuf,
    info_path: PathBuf,
}

impl FlyeParser {
    #[must_use]
    pub fn new(graph_path: PathBuf, info_path: PathBuf) -> Self {
        Self {
            graph_path,
            info_path,
        }
    }
}

impl GraphParser for FlyeParser {
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError> {
        let paths = read_assembly_info(&self.info_path)?;
        let gfa = read_gfa(&self.graph_path, false)?;
        let assembly = contig_graph(&paths, &gfa)?;

        info!(
            "Flye graph: {} contigs, {} edges",
            assembly.graph.node_count(),
            assembly.graph.edge_count()
        );
        Ok(assembly)
    }
}

/// Contig paths through the Flye repeat graph
#[derive(Debug)]
pub struct EdgePaths {
    pub contigs: ContigNames,
    /// Signed graph edges of each contig, e.g. `["12", "-7", "3"]`
    pub paths: Vec<Vec<String>>,
}

impl EdgePaths {
    /// Signed graph edge to the contigs whose paths use it
    fn edge_contigs(&self) -> HashMap<&str, BTreeSet<VertexId>> {
        let mut map: HashMap<&str, BTreeSet<VertexId>> = HashMap::new();
        for (vertex, path) in self.paths.iter().enumerate() {
            for edge in path {
                map.entry(edge.as_str()).or_default().insert(vertex);
            }
        }
        map
    }
}

/// Read a Flye `assembly_info.txt` file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::InvalidFormat` if a row has no path column.
pub fn read_assembly_info(path: &Path) -> Result<EdgePaths, ParseError> {
    parse_assembly_info(&read_lines(path)?)
}

/// Parse the rows of an `assembly_info.txt` file
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a row has no path column.
pub fn parse_assembly_info(lines: &[String]) -> Result<EdgePaths, ParseError> {
    let mut contigs = ContigNames::new(ContigKey::Exact);
    let mut paths = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {}: expected a contig name and a graph path",
                idx + 1
            )));
        }

        if contigs.resolve(fields[0]).is_none() && check_contig_limit(contigs.len()).is_some() {
            return Err(ParseError::TooManyContigs(contigs.len()));
        }
        let vertex = contigs.insert(fields[0]);
        if vertex == paths.len() {
            let path = fields[fields.len() - 1].replace('*', "");
            paths.push(
                path.split(',')
                    .filter(|edge| !edge.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
    }

    Ok(EdgePaths { contigs, paths })
}

/// Signed graph edge id of a GFA segment name (`edge_12` on the reverse strand is `-12`)
fn signed_edge(segment: &str, orient: Orientation) -> String {
    let id = segment.strip_prefix("edge_").unwrap_or(segment);
    match orient {
        Orientation::Forward => id.to_string(),
        Orientation::Reverse => format!("-{id}"),
    }
}

fn link_map(links: &[Link]) -> HashMap<String, HashSet<String>> {
    let mut map: HashMap<String, HashSet<String>> = HashMap::new();
    for link in links {
        let from = signed_edge(&link.from, link.from_orient);
        let to = signed_edge(&link.to, link.to_orient);
        map.entry(from.clone()).or_default().insert(to.clone());
        map.entry(to).or_default().insert(from);
    }
    map
}

/// Build the contig graph from contig paths and graph edge links
///
/// # Errors
///
/// Returns `ParseError::Graph` if an edge is out of range.
pub fn contig_graph(paths: &EdgePaths, gfa: &GfaRecords) -> Result<AssemblyGraph, ParseError> {
    let links = link_map(&gfa.links);
    let edge_contigs = paths.edge_contigs();
    let mut graph = ContigGraph::new(paths.contigs.len());

    let mut connect = |vertex: VertexId, edge: &str| -> Result<(), ParseError> {
        for &other in edge_contigs.get(edge).into_iter().flatten() {
            if other != vertex {
                graph.add_edge(vertex, other)?;
            }
        }
        Ok(())
    };

    for (vertex, path) in paths.paths.iter().enumerate() {
        let mut linked = Vec::new();

        for edge in path {
            let reverse = match edge.strip_prefix('-') {
                Some(id) => id.to_string(),
                None => format!("-{edge}"),
            };

            // Paths sharing a graph edge on either strand overlap
            for strand in [edge.as_str(), reverse.as_str()] {
                linked.extend(links.get(strand).into_iter().flatten());
                connect(vertex, strand)?;
            }
        }

        for edge in linked {
            connect(vertex, edge.as_str())?;
            if let Some(unsigned) = edge.strip_prefix('-') {
                connect(vertex, unsigned)?;
            }
        }
    }
    graph.simplify();

    Ok(AssemblyGraph {
        graph,
        contigs: paths.contigs.clone(),
    })
}
