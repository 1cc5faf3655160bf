//! SPAdes assembly graph parser.
//!
//! SPAdes contigs are paths through the `assembly_graph_with_scaffolds.gfa`
//! segment graph, listed in `contigs.paths` as alternating name and path lines:
//!
//! ```text
//! NODE_1_length_2500_cov_12.5
//! 4+,7-,12+
//! NODE_1_length_2500_cov_12.5'
//! 12-,7+,4-
//! ```
//!
//! A path line ending in `;` is continued on the next line (a gap in the
//! scaffold). Two contigs are adjacent when an end segment of one is linked
//! to any segment of the other.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::contig_names::{spades_node_number, ContigKey, ContigNames};
use crate::core::graph::ContigGraph;
use crate::core::types::VertexId;
use crate::parsing::gfa::{read_gfa, GfaRecords};
use crate::parsing::{read_lines, AssemblyGraph, GraphParser, ParseError};
use crate::utils::validation::check_contig_limit;

pub struct SpadesParser {
    graph_path: PathBuf,
    paths_path: PathBuf,
}

impl SpadesParser {
    #[must_use]
    pub fn new(graph_path: PathBuf, paths_path: PathBuf) -> Self {
        Self {
            graph_path,
            paths_path,
        }
    }
}

impl GraphParser for SpadesParser {
    fn parse_graph(&self) -> Result<AssemblyGraph, ParseError> {
        let paths = read_contig_paths(&self.paths_path)?;
        let links = read_gfa(&self.graph_path, false)?;
        let assembly = contig_graph(&paths, &links)?;

        info!(
            "SPAdes graph: {} contigs, {} edges",
            assembly.graph.node_count(),
            assembly.graph.edge_count()
        );
        Ok(assembly)
    }
}

/// Contig paths read from `contigs.paths`
#[derive(Debug)]
pub struct ContigPaths {
    pub contigs: ContigNames,
    /// First and last segment of each contig's forward path
    pub ends: Vec<(String, String)>,
    /// Oriented segment (e.g. `7-`) to the contigs whose paths use it
    pub segment_contigs: HashMap<String, BTreeSet<VertexId>>,
}

/// Read a SPAdes `contigs.paths` file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read or
/// `ParseError::InvalidFormat` if a name is not a SPAdes contig name or has no path.
pub fn read_contig_paths(path: &Path) -> Result<ContigPaths, ParseError> {
    parse_contig_paths(&read_lines(path)?)
}

/// Parse the lines of a `contigs.paths` file
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a name is not a SPAdes contig name or has no path.
pub fn parse_contig_paths(lines: &[String]) -> Result<ContigPaths, ParseError> {
    let mut paths = ContigPaths {
        contigs: ContigNames::new(ContigKey::SpadesNode),
        ends: Vec::new(),
        segment_contigs: HashMap::new(),
    };
    let mut lines = lines.iter().map(|l| l.trim()).enumerate();

    while let Some((idx, name)) = lines.next() {
        if name.is_empty() {
            continue;
        }
        if spades_node_number(name).is_none() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {}: '{name}' is not a SPAdes contig name",
                idx + 1
            )));
        }

        let mut path = String::new();
        loop {
            let Some((_, part)) = lines.next() else {
                return Err(ParseError::InvalidFormat(format!(
                    "Contig '{name}' has no path"
                )));
            };
            match part.strip_suffix(';') {
                Some(gapped) => {
                    path.push_str(gapped);
                    path.push(',');
                }
                None => {
                    path.push_str(part);
                    break;
                }
            }
        }
        let segments: Vec<&str> = path.split(',').filter(|s| !s.is_empty()).collect();
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Err(ParseError::InvalidFormat(format!(
                "Contig '{name}' has an empty path"
            )));
        };

        let known = paths.contigs.len();
        if paths.contigs.resolve(name).is_none() && check_contig_limit(known).is_some() {
            return Err(ParseError::TooManyContigs(known));
        }
        let vertex = paths.contigs.insert(name);
        if vertex == paths.ends.len() {
            paths.ends.push(((*first).to_string(), (*last).to_string()));
        }
        for segment in segments {
            paths
                .segment_contigs
                .entry(segment.to_string())
                .or_default()
                .insert(vertex);
        }
    }

    Ok(paths)
}

/// Oriented segment with its orientation flipped
fn reversed(segment: &str) -> String {
    match segment.strip_suffix('+') {
        Some(base) => format!("{base}-"),
        None => match segment.strip_suffix('-') {
            Some(base) => format!("{base}+"),
            None => segment.to_string(),
        },
    }
}

/// Build the contig graph from contig paths and segment links
///
/// # Errors
///
/// Returns `ParseError::Graph` if an edge is out of range (which would indicate
/// inconsistent path bookkeeping).
pub fn contig_graph(paths: &ContigPaths, gfa: &GfaRecords) -> Result<AssemblyGraph, ParseError> {
    let mut links_map: HashMap<String, HashSet<String>> = HashMap::new();
    for link in &gfa.links {
        let from = format!("{}{}", link.from, link.from_orient.symbol());
        let to = format!("{}{}", link.to, link.to_orient.symbol());
        links_map.entry(from.clone()).or_default().insert(to.clone());
        links_map.entry(to).or_default().insert(from);
    }

    let mut graph = ContigGraph::new(paths.contigs.len());
    for (vertex, (start, end)) in paths.ends.iter().enumerate() {
        let ends = [start.clone(), reversed(start), end.clone(), reversed(end)];
        let linked = ends
            .iter()
            .filter_map(|segment| links_map.get(segment))
            .flatten();

        for segment in linked {
            for &other in paths.segment_contigs.get(segment).into_iter().flatten() {
                if other != vertex {
                    graph.add_edge(vertex, other)?;
                }
            }
        }
    }
    graph.simplify();

    Ok(AssemblyGraph {
        graph,
        contigs: paths.contigs.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::gfa::parse_gfa;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const PATHS: &str = "NODE_1_length_500_cov_2.0\n\
1+,2+\n\
NODE_1_length_500_cov_2.0'\n\
2-,1-\n\
NODE_2_length_300_cov_1.5\n\
3+;\n\
4+\n\
NODE_2_length_300_cov_1.5'\n\
4-;\n\
3-\n\
NODE_3_length_100_cov_1.0\n\
5+\n\
NODE_3_length_100_cov_1.0'\n\
5-\n";

    const LINKS: &str = "S\t1\t*\nS\t2\t*\nS\t3\t*\nS\t4\t*\nS\t5\t*\n\
L\t2\t+\t3\t+\t0M\n\
L\t4\t+\t4\t-\t0M\n";

    #[test]
    fn test_parse_contig_paths() {
        let paths = parse_contig_paths(&lines(PATHS)).unwrap();

        assert_eq!(paths.contigs.len(), 3);
        assert_eq!(paths.contigs.name(0), Some("NODE_1_length_500_cov_2.0"));
        assert_eq!(paths.ends[0], ("1+".to_string(), "2+".to_string()));
        // Gapped path continues on the next line
        assert_eq!(paths.ends[1], ("3+".to_string(), "4+".to_string()));
        assert_eq!(paths.segment_contigs["4-"], BTreeSet::from([1]));
    }

    #[test]
    fn test_contig_graph() {
        let paths = parse_contig_paths(&lines(PATHS)).unwrap();
        let gfa = parse_gfa(Cursor::new(LINKS), false).unwrap();
        let assembly = contig_graph(&paths, &gfa).unwrap();

        assert_eq!(assembly.graph.node_count(), 3);
        assert!(assembly.graph.contains_edge(0, 1));
        // Link from a contig to itself produces no edge
        assert_eq!(assembly.graph.edge_count(), 1);
        assert_eq!(assembly.graph.degree(2), 0);
    }

    #[test]
    fn test_non_spades_name_rejected() {
        let result = parse_contig_paths(&lines("contig_1\n1+\n"));
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_path_rejected() {
        let result = parse_contig_paths(&lines("NODE_1_length_5_cov_1\n"));
        assert!(matches!(result, Err(ParseError::InvalidFormat(_))));
    }

    #[test]
    fn test_reversed() {
        assert_eq!(reversed("12+"), "12-");
        assert_eq!(reversed("12-"), "12+");
    }

    #[test]
    fn test_spades_parser_from_files() {
        let mut graph_file = NamedTempFile::with_suffix(".gfa").unwrap();
        graph_file.write_all(LINKS.as_bytes()).unwrap();
        graph_file.flush().unwrap();
        let mut paths_file = NamedTempFile::with_suffix(".paths").unwrap();
        paths_file.write_all(PATHS.as_bytes()).unwrap();
        paths_file.flush().unwrap();

        let assembly = SpadesParser::new(
            graph_file.path().to_path_buf(),
            paths_file.path().to_path_buf(),
        )
        .parse_graph()
        .unwrap();

        assert_eq!(assembly.graph.edge_count(), 1);
        assert_eq!(assembly.contigs.resolve("NODE_3_length_100_cov_1.0"), Some(2));
    }
}
