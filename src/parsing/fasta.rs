//! FASTA reading using noodles.
//!
//! Contig sequences are needed to map MEGAHIT graph segments back to the
//! assembler's contig names and to write per-bin FASTA files.
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;

use crate::parsing::ParseError;
use crate::utils::validation::check_contig_limit;

/// Check if the path has a FASTA extension
pub fn is_fasta_file(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();

    // Check for gzipped FASTA
    if path_str.ends_with(".fa.gz")
        || path_str.ends_with(".fasta.gz")
        || path_str.ends_with(".fna.gz")
        || path_str.ends_with(".fa.bgz")
        || path_str.ends_with(".fasta.bgz")
        || path_str.ends_with(".fna.bgz")
    {
        return true;
    }

    matches!(
        path.extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase)
            .as_deref(),
        Some("fa" | "fasta" | "fna")
    )
}

/// Check if the path is a gzipped file
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Open a FASTA file, decompressing it if needed
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_fasta(path: &Path) -> Result<fasta::io::Reader<Box<dyn BufRead>>, ParseError> {
    let file = File::open(path)?;
    let inner: Box<dyn BufRead> = if is_gzipped(path) {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(fasta::io::Reader::new(inner))
}

/// A contig name and its sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Read every record of a FASTA file in file order.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, `ParseError::InvalidFormat` if no contigs are found, or
/// `ParseError::TooManyContigs` if the limit is exceeded.
pub fn read_records(path: &Path) -> Result<Vec<fasta::Record>, ParseError> {
    let mut reader = open_fasta(path)?;
    read_records_from(&mut reader)
}

/// Read every record of a FASTA file as a name and sequence pair
///
/// # Errors
///
/// See [`read_records`].
pub fn read_sequences(path: &Path) -> Result<Vec<SequenceRecord>, ParseError> {
    Ok(read_records(path)?
        .iter()
        .map(|record| SequenceRecord {
            name: String::from_utf8_lossy(record.name()).to_string(),
            sequence: record.sequence().as_ref().to_vec(),
        })
        .collect())
}

fn read_records_from<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<fasta::Record>, ParseError> {
    let mut records = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        if check_contig_limit(records.len()).is_some() {
            return Err(ParseError::TooManyContigs(records.len()));
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(records)
}
