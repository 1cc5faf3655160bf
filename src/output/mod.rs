//! Writers for refined binning results.
//!
//! All files are written under the output directory and carry the run prefix:
//!
//! - `{prefix}graphbin_output.csv`: `contig<delim>bin` for every binned contig
//! - `{prefix}graphbin_unbinned.csv`: contigs left without a bin (only when non-empty)
//! - `{prefix}bins/{prefix}bin_{label}.fasta`: contig sequences per bin

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use noodles::fasta;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::contig_names::ContigNames;
use crate::core::types::{Assembler, BinIndex, VertexId};
use crate::refine::config::RefineConfig;
use crate::refine::engine::{FinalBinning, RefineStats};
use crate::refine::propagation::PropagationOutcome;
use crate::utils::validation::sanitize_label;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Contig {0} has no name")]
    UnnamedContig(VertexId),

    #[error("Bins '{first}' and '{second}' would both be written to {}", .path.display())]
    BinFileCollision {
        first: String,
        second: String,
        path: PathBuf,
    },
}

/// Locations of the files produced by one run
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
    prefix: String,
}

impl OutputLayout {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn binning_csv(&self) -> PathBuf {
        self.dir.join(format!("{}graphbin_output.csv", self.prefix))
    }

    #[must_use]
    pub fn unbinned_csv(&self) -> PathBuf {
        self.dir.join(format!("{}graphbin_unbinned.csv", self.prefix))
    }

    #[must_use]
    pub fn bins_dir(&self) -> PathBuf {
        self.dir.join(format!("{}bins", self.prefix))
    }

    #[must_use]
    pub fn bin_fasta(&self, label: &str) -> PathBuf {
        self.bins_dir()
            .join(format!("{}bin_{}.fasta", self.prefix, sanitize_label(label)))
    }
}

/// Quote a CSV field only when it contains the delimiter, a quote or a line break
fn csv_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains(['"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn contig_name(contigs: &ContigNames, vertex: VertexId) -> Result<&str, OutputError> {
    contigs
        .name(vertex)
        .ok_or(OutputError::UnnamedContig(vertex))
}

/// Write `contig<delim>bin` rows, bins in catalog order and contigs ascending
///
/// # Errors
///
/// Returns `OutputError::Io` if the file cannot be written.
pub fn write_binning_csv(
    path: &Path,
    result: &FinalBinning,
    contigs: &ContigNames,
    delimiter: char,
) -> Result<usize, OutputError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut rows = 0;
    for (vertex, label) in result.labelled() {
        writeln!(
            writer,
            "{}{delimiter}{}",
            csv_field(contig_name(contigs, vertex)?, delimiter),
            csv_field(label, delimiter)
        )?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

/// Write the names of contigs without a final bin.
///
/// Nothing is written when every contig is binned.
///
/// # Errors
///
/// Returns `OutputError::Io` if the file cannot be written.
pub fn write_unbinned_csv(
    path: &Path,
    result: &FinalBinning,
    contigs: &ContigNames,
    delimiter: char,
) -> Result<usize, OutputError> {
    let unbinned: Vec<VertexId> = result.unbinned().collect();
    if unbinned.is_empty() {
        return Ok(0);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    for &vertex in &unbinned {
        writeln!(writer, "{}", csv_field(contig_name(contigs, vertex)?, delimiter))?;
    }
    writer.flush()?;
    Ok(unbinned.len())
}

/// FASTA file of every non-empty bin, in catalog order.
///
/// File names use the sanitised bin label. Two labels that sanitise to the
/// same name are rejected.
///
/// # Errors
///
/// Returns `OutputError::BinFileCollision` if two bins share a file name.
pub fn bin_fasta_paths(
    layout: &OutputLayout,
    result: &FinalBinning,
) -> Result<Vec<(BinIndex, PathBuf)>, OutputError> {
    let catalog = result.bins.catalog();
    let mut owners: HashMap<PathBuf, &str> = HashMap::new();
    let mut paths = Vec::new();

    for (bin, label) in catalog.labels().enumerate() {
        if result.bins.members(bin).is_empty() {
            continue;
        }
        let path = layout.bin_fasta(label);
        if let Some(first) = owners.insert(path.clone(), label) {
            return Err(OutputError::BinFileCollision {
                first: first.to_string(),
                second: label.to_string(),
                path,
            });
        }
        paths.push((bin, path));
    }
    Ok(paths)
}

/// Split contig records into one FASTA file per non-empty bin.
///
/// Records whose name does not resolve to a binned contig are skipped.
///
/// # Errors
///
/// Returns `OutputError::BinFileCollision` before anything is written if two
/// bins share a file name, and `OutputError::Io` if a bin file cannot be written.
pub fn write_bin_fastas(
    layout: &OutputLayout,
    records: &[fasta::Record],
    result: &FinalBinning,
    contigs: &ContigNames,
) -> Result<Vec<PathBuf>, OutputError> {
    let planned = bin_fasta_paths(layout, result)?;
    fs::create_dir_all(layout.bins_dir())?;

    let mut sinks: HashMap<BinIndex, BufWriter<File>> = HashMap::new();
    let mut paths = Vec::with_capacity(planned.len());
    for (bin, path) in planned {
        sinks.insert(bin, BufWriter::new(File::create(&path)?));
        paths.push(path);
    }

    let mut written = 0usize;
    for record in records {
        let name = String::from_utf8_lossy(record.name());
        let Some(bin) = contigs.resolve(&name).and_then(|v| result.bin_of(v)) else {
            continue;
        };
        if let Some(sink) = sinks.get_mut(&bin) {
            fasta::io::Writer::new(sink).write_record(record)?;
            written += 1;
        }
    }

    for sink in sinks.values_mut() {
        sink.flush()?;
    }

    let expected = result.bins.assigned_count();
    if written < expected {
        warn!(
            "{} binned contigs were not found in the contigs file",
            expected - written
        );
    }
    info!("Wrote {} bin FASTA files to {}", paths.len(), layout.bins_dir().display());
    Ok(paths)
}

/// Files produced by a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct WrittenFiles {
    pub binning: Option<PathBuf>,
    pub unbinned: Option<PathBuf>,
    pub bin_fastas: Vec<PathBuf>,
}

/// Summary of a refinement run, printed at the end of the command
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub assembler: Assembler,
    pub config: RefineConfig,
    pub stats: RefineStats,
    pub propagation: Option<PropagationOutcome>,
    pub removed_before_propagation: Vec<String>,
    pub removed_after_propagation: Vec<String>,
    pub files: WrittenFiles,
}

impl RunSummary {
    #[must_use]
    pub fn new(
        assembler: Assembler,
        config: RefineConfig,
        result: &FinalBinning,
        contigs: &ContigNames,
        files: WrittenFiles,
    ) -> Self {
        let names = |set: &BTreeSet<VertexId>| -> Vec<String> {
            set.iter()
                .filter_map(|&v| contigs.name(v).map(str::to_string))
                .collect()
        };
        Self {
            assembler,
            config,
            stats: result.stats.clone(),
            propagation: result.propagation,
            removed_before_propagation: names(&result.removed.before_propagation),
            removed_after_propagation: names(&result.removed.after_propagation),
            files,
        }
    }

    /// Print a human-readable summary to stdout
    pub fn print_text(&self) {
        let stats = &self.stats;
        println!("GraphBin refinement ({})", self.assembler);
        println!("{}", "─".repeat(60));
        println!(
            "Assembly graph:     {} contigs, {} edges",
            stats.node_count, stats.edge_count
        );
        println!(
            "Initial binning:    {} contigs in {} bins",
            stats.initially_binned, stats.n_bins
        );
        println!(
            "Ambiguous removed:  {} (direct), {} (nearest labelled)",
            stats.removed_direct, stats.removed_nearest
        );
        println!("Reachable contigs:  {}", stats.eligible);

        match &self.propagation {
            Some(outcome) => println!(
                "Label propagation:  {} contigs labelled in {} iterations (diff {:.3e}{})",
                stats.propagated,
                outcome.iterations,
                outcome.diff,
                if outcome.converged { "" } else { ", not converged" }
            ),
            None => println!("Label propagation:  skipped (no labelled contigs)"),
        }

        println!(
            "Post-propagation:   {} removed",
            stats.removed_after_propagation
        );
        println!(
            "Final binning:      {} of {} contigs binned",
            stats.finally_binned, stats.node_count
        );

        if let Some(path) = &self.files.binning {
            println!("\nBinning result:     {}", path.display());
        }
        if let Some(path) = &self.files.unbinned {
            println!("Unbinned contigs:   {}", path.display());
        }
        if !self.files.bin_fastas.is_empty() {
            println!("Bin FASTA files:    {}", self.files.bin_fastas.len());
        }
    }

    /// Print the summary as pretty JSON to stdout
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn print_json(&self) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binning::{BinAssignment, BinCatalog};
    use crate::core::contig_names::ContigKey;
    use crate::core::graph::ContigGraph;
    use crate::parsing::fasta::read_records;
    use crate::refine::engine::RefinementEngine;
    use std::io::Write as _;
    use tempfile::{NamedTempFile, TempDir};

    fn refined() -> (FinalBinning, ContigNames) {
        refined_with_labels(["A", "B"])
    }

    /// 0 (first) - 1 (first) - 2     3 (second) - 4 (second)     5
    fn refined_with_labels(labels: [&str; 2]) -> (FinalBinning, ContigNames) {
        let graph = ContigGraph::from_edges(6, [(0, 1), (1, 2), (3, 4)]).unwrap();
        let catalog = BinCatalog::from_labels(labels);
        let bins =
            BinAssignment::from_records(catalog, 6, [(0, 0), (1, 0), (3, 1), (4, 1)]).unwrap();
        let result = RefinementEngine::new(RefineConfig::default())
            .unwrap()
            .run(&graph, bins)
            .unwrap();

        let mut contigs = ContigNames::new(ContigKey::Exact);
        for name in ["c0", "c1", "c,2", "c3", "c4", "c5"] {
            contigs.insert(name);
        }
        (result, contigs)
    }

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/out", "run1_");
        assert_eq!(
            layout.binning_csv(),
            PathBuf::from("/out/run1_graphbin_output.csv")
        );
        assert_eq!(
            layout.unbinned_csv(),
            PathBuf::from("/out/run1_graphbin_unbinned.csv")
        );
        assert_eq!(
            layout.bin_fasta("7"),
            PathBuf::from("/out/run1_bins/run1_bin_7.fasta")
        );
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain", ','), "plain");
        assert_eq!(csv_field("a,b", ','), "\"a,b\"");
        assert_eq!(csv_field("a,b", '\t'), "a,b");
        assert_eq!(csv_field("say \"hi\"", ','), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_write_binning_and_unbinned() {
        let (result, contigs) = refined();
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "");

        let rows = write_binning_csv(&layout.binning_csv(), &result, &contigs, ',').unwrap();
        assert_eq!(rows, 5);
        let text = fs::read_to_string(layout.binning_csv()).unwrap();
        assert_eq!(text, "c0,A\nc1,A\n\"c,2\",A\nc3,B\nc4,B\n");

        let unbinned =
            write_unbinned_csv(&layout.unbinned_csv(), &result, &contigs, ',').unwrap();
        assert_eq!(unbinned, 1);
        assert_eq!(fs::read_to_string(layout.unbinned_csv()).unwrap(), "c5\n");
    }

    #[test]
    fn test_unbinned_not_written_when_empty() {
        let graph = ContigGraph::from_edges(2, [(0, 1)]).unwrap();
        let bins =
            BinAssignment::from_records(BinCatalog::from_labels(["A"]), 2, [(0, 0)]).unwrap();
        let result = RefinementEngine::new(RefineConfig::default())
            .unwrap()
            .run(&graph, bins)
            .unwrap();
        let mut contigs = ContigNames::new(ContigKey::Exact);
        contigs.insert("x");
        contigs.insert("y");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("graphbin_unbinned.csv");
        assert_eq!(write_unbinned_csv(&path, &result, &contigs, ',').unwrap(), 0);
        assert!(!path.exists());
    }

    fn fasta_records(text: &[u8]) -> Vec<fasta::Record> {
        let mut fasta_file = NamedTempFile::with_suffix(".fa").unwrap();
        fasta_file.write_all(text).unwrap();
        fasta_file.flush().unwrap();
        read_records(fasta_file.path()).unwrap()
    }

    #[test]
    fn test_write_bin_fastas() {
        let (result, contigs) = refined();
        let records = fasta_records(b">c0\nAAAA\n>c3 extra\nCCCC\n>c5\nGGGG\n>unknown\nTTTT\n");

        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "s_");
        let paths = write_bin_fastas(&layout, &records, &result, &contigs).unwrap();

        assert_eq!(paths.len(), 2);
        let bin_a = fs::read_to_string(layout.bin_fasta("A")).unwrap();
        assert!(bin_a.contains(">c0"));
        assert!(bin_a.contains("AAAA"));
        assert!(!bin_a.contains("GGGG"));
        let bin_b = fs::read_to_string(layout.bin_fasta("B")).unwrap();
        assert!(bin_b.contains(">c3"));
        assert!(bin_b.contains("CCCC"));
    }

    #[test]
    fn test_summary_json() {
        let (result, contigs) = refined();
        let summary = RunSummary::new(
            Assembler::Canu,
            RefineConfig::default(),
            &result,
            &contigs,
            WrittenFiles::default(),
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["assembler"], "canu");
        assert_eq!(json["stats"]["finally_binned"], 5);
        assert_eq!(json["config"]["max_iteration"], 100);
    }

    #[test]
    fn test_colliding_bin_file_names_rejected() {
        // "a/b" is sanitised to "a_b"
        let (result, contigs) = refined_with_labels(["a/b", "a_b"]);
        let records = fasta_records(b">c0\nAAAA\n>c3\nCCCC\n");

        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path(), "");

        let err = bin_fasta_paths(&layout, &result).unwrap_err();
        assert!(matches!(
            &err,
            OutputError::BinFileCollision { first, second, .. } if first == "a/b" && second == "a_b"
        ));

        assert!(matches!(
            write_bin_fastas(&layout, &records, &result, &contigs),
            Err(OutputError::BinFileCollision { .. })
        ));
        assert!(!layout.bins_dir().exists());
    }

    #[test]
    fn test_bin_fasta_paths() {
        let (result, _) = refined_with_labels(["x", "y"]);
        let layout = OutputLayout::new("/out", "");

        let paths = bin_fasta_paths(&layout, &result).unwrap();
        assert_eq!(
            paths,
            vec![
                (0, PathBuf::from("/out/bins/bin_x.fasta")),
                (1, PathBuf::from("/out/bins/bin_y.fasta")),
            ]
        );
    }
}
