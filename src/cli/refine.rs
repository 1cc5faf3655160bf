use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::core::types::{Assembler, DEFAULT_DIFF_THRESHOLD, DEFAULT_MAX_ITERATION};
use crate::output::{self, OutputLayout, RunSummary, WrittenFiles};
use crate::parsing::fasta::{is_fasta_file, read_records};
use crate::parsing::{self, binning::read_initial_binning, AssemblyInputs};
use crate::refine::config::RefineConfig;
use crate::refine::engine::RefinementEngine;
use crate::utils::validation::{parse_delimiter, require_file, validate_prefix};

#[derive(Args)]
pub struct RefineArgs {
    /// Assembler that produced the assembly graph
    #[arg(short, long, value_enum)]
    pub assembler: Assembler,

    /// Assembly graph (.gfa, or .asqg for SGA)
    #[arg(short, long)]
    pub graph: PathBuf,

    /// Contig paths (contigs.paths for SPAdes, assembly_info.txt for Flye)
    #[arg(short, long)]
    pub paths: Option<PathBuf>,

    /// Contig sequences. Required for MEGAHIT; when given, per-bin FASTA files are written
    #[arg(short, long)]
    pub contigs: Option<PathBuf>,

    /// Initial binning result with contig and bin columns
    #[arg(short, long)]
    pub binned: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Prefix for output file names
    #[arg(long, default_value = "")]
    pub prefix: String,

    /// Column delimiter of the binning files (comma, semicolon, tab or space)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: char,

    /// Maximum number of label propagation iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATION)]
    pub max_iteration: usize,

    /// Propagation stops once the total change of an iteration falls below this
    #[arg(long, default_value_t = DEFAULT_DIFF_THRESHOLD)]
    pub diff_threshold: f64,

    /// Never strip a bin below this many contigs (10 when given without a value)
    #[arg(long, num_args = 0..=1, default_missing_value = "10")]
    pub min_bin_count: Option<usize>,
}

impl RefineArgs {
    fn config(&self) -> RefineConfig {
        RefineConfig::default()
            .with_max_iteration(self.max_iteration)
            .with_diff_threshold(self.diff_threshold)
            .with_min_bin_count(self.min_bin_count)
    }

    /// Check that every file the assembler needs was given and exists
    fn check_inputs(&self) -> anyhow::Result<AssemblyInputs> {
        require_file(&self.graph)?;
        require_file(&self.binned)?;

        if self.assembler.requires_paths() && self.paths.is_none() {
            anyhow::bail!("{} requires --paths", self.assembler);
        }
        if self.assembler.requires_contigs() && self.contigs.is_none() {
            anyhow::bail!("{} requires --contigs", self.assembler);
        }
        for path in self.paths.iter().chain(&self.contigs) {
            require_file(path)?;
        }
        if let Some(contigs) = self.contigs.as_deref().filter(|p| !is_fasta_file(p)) {
            warn!(
                "{} does not have a FASTA extension; reading it as FASTA anyway",
                contigs.display()
            );
        }

        Ok(AssemblyInputs {
            graph: self.graph.clone(),
            paths: self.paths.clone(),
            contigs: self.contigs.clone(),
        })
    }
}

/// Execute refine subcommand
///
/// # Errors
///
/// Returns an error if an input is missing or malformed, the configuration is
/// invalid, or the results cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RefineArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let prefix = validate_prefix(&args.prefix)?;
    let inputs = args.check_inputs()?;
    let config = args.config();
    let engine = RefinementEngine::new(config.clone())?;

    if verbose {
        eprintln!(
            "Refining {} binning with max {} iterations, diff threshold {}{}",
            args.assembler,
            config.max_iteration,
            config.diff_threshold,
            config
                .min_bin_count
                .map(|n| format!(", bins kept above {n} contigs"))
                .unwrap_or_default()
        );
    }

    let assembly = parsing::parser_for(args.assembler, &inputs)?
        .parse_graph()
        .with_context(|| format!("Failed to parse assembly graph {}", args.graph.display()))?;
    let bins = read_initial_binning(&args.binned, args.delimiter, &assembly.contigs)
        .with_context(|| format!("Failed to read initial binning {}", args.binned.display()))?;

    let result = engine.run(&assembly.graph, bins)?;

    let layout = OutputLayout::new(&args.output, prefix);
    let contig_records = args
        .contigs
        .as_deref()
        .map(|path| {
            read_records(path)
                .with_context(|| format!("Failed to read contigs {}", path.display()))
        })
        .transpose()?;
    if contig_records.is_some() {
        output::bin_fasta_paths(&layout, &result)?;
    }

    fs::create_dir_all(&args.output).with_context(|| {
        format!("Failed to create output directory {}", args.output.display())
    })?;
    let mut files = WrittenFiles::default();

    let binning_path = layout.binning_csv();
    output::write_binning_csv(&binning_path, &result, &assembly.contigs, args.delimiter)?;
    info!("Final binning result written to {}", binning_path.display());
    files.binning = Some(binning_path);

    let unbinned_path = layout.unbinned_csv();
    if output::write_unbinned_csv(&unbinned_path, &result, &assembly.contigs, args.delimiter)? > 0
    {
        info!("Unbinned contigs written to {}", unbinned_path.display());
        files.unbinned = Some(unbinned_path);
    }

    if let Some(records) = &contig_records {
        files.bin_fastas =
            output::write_bin_fastas(&layout, records, &result, &assembly.contigs)?;
    }

    let summary = RunSummary::new(args.assembler, config, &result, &assembly.contigs, files);
    match format {
        OutputFormat::Text => summary.print_text(),
        OutputFormat::Json => summary.print_json()?,
    }

    Ok(())
}
