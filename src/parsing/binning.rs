use std::path::Path;

use tracing::info;

use crate::core::binning::{BinAssignment, BinCatalog, BinningError};
use crate::core::contig_names::ContigNames;
use crate::parsing::ParseError;

/// One `contig,bin` row of an initial binning result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinningRecord {
    pub contig: String,
    pub bin: String,
}

/// Parse an initial binning file with columns: contig name, bin label
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_binning_file(path: &Path, delimiter: char) -> Result<Vec<BinningRecord>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_binning_text(&content, delimiter)
}

/// Parse initial binning text with columns: contig name, bin label
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line has fewer than 2 fields or an
/// empty contig name or bin label.
pub fn parse_binning_text(text: &str, delimiter: char) -> Result<Vec<BinningRecord>, ParseError> {
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let line_num = i + 1;

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields (is the delimiter '{}'?)",
                delimiter.escape_default()
            )));
        }

        let contig = fields[0].trim();
        let bin = fields[1].trim();
        if contig.is_empty() || bin.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has an empty contig name or bin label"
            )));
        }

        records.push(BinningRecord {
            contig: contig.to_string(),
            bin: bin.to_string(),
        });
    }

    Ok(records)
}

/// Resolve binning records against the assembly's contigs.
///
/// Every label in the file becomes a bin, including labels whose contigs are
/// all filtered out later.
///
/// # Errors
///
/// Returns `ParseError::UnknownContig` if a contig is not in the graph and
/// `ParseError::ConflictingBins` if a contig is given two different bins.
pub fn build_assignment(
    records: &[BinningRecord],
    contigs: &ContigNames,
) -> Result<BinAssignment, ParseError> {
    let catalog = BinCatalog::from_labels(records.iter().map(|r| r.bin.as_str()));
    let mut bins = BinAssignment::new(catalog, contigs.len());

    for record in records {
        let vertex = contigs
            .resolve(&record.contig)
            .ok_or_else(|| ParseError::UnknownContig(record.contig.clone()))?;
        let bin = bins
            .catalog()
            .index_of(&record.bin)
            .ok_or_else(|| BinningError::UnknownBin(record.bin.clone()))?;

        match bins.assign(vertex, bin) {
            Ok(_) => {}
            Err(BinningError::InconsistentLabeling { first, second, .. }) => {
                return Err(ParseError::ConflictingBins {
                    contig: record.contig.clone(),
                    first,
                    second,
                });
            }
            Err(other) => return Err(other.into()),
        }
    }

    Ok(bins)
}

/// Read an initial binning result and map it onto the assembly graph
///
/// # Errors
///
/// Returns any error from [`parse_binning_file`] or [`build_assignment`].
pub fn read_initial_binning(
    path: &Path,
    delimiter: char,
    contigs: &ContigNames,
) -> Result<BinAssignment, ParseError> {
    let records = parse_binning_file(path, delimiter)?;
    let bins = build_assignment(&records, contigs)?;

    info!(
        "Initial binning: {} of {} contigs in {} bins",
        bins.assigned_count(),
        bins.node_count(),
        bins.n_bins()
    );
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig_names::ContigKey;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn spades_contigs() -> ContigNames {
        let mut contigs = ContigNames::new(ContigKey::SpadesNode);
        contigs.insert("NODE_1_length_500_cov_2.0");
        contigs.insert("NODE_2_length_300_cov_1.5");
        contigs.insert("NODE_3_length_100_cov_1.0");
        contigs
    }

    #[test]
    fn test_parse_binning_text() {
        let text = "NODE_1_length_500_cov_2.0,bin_2\n\nNODE_2_length_300_cov_1.5, bin_1\r\n";
        let records = parse_binning_text(text, ',').unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].contig, "NODE_2_length_300_cov_1.5");
        assert_eq!(records[1].bin, "bin_1");
    }

    #[test]
    fn test_parse_binning_tab_delimited() {
        let records = parse_binning_text("contig_1\t3\ncontig_2\t1\n", '\t').unwrap();
        assert_eq!(records[0].bin, "3");
    }

    #[test]
    fn test_wrong_delimiter_reported() {
        let err = parse_binning_text("contig_1\t3\n", ',').unwrap_err();
        assert!(matches!(err, ParseError::InvalidFormat(_)));
        assert!(err.to_string().contains("Line 1"));
    }

    #[test]
    fn test_build_assignment_sorts_labels() {
        let records = parse_binning_text(
            "NODE_1_length_500_cov_2.0,bin_2\nNODE_2_length_300_cov_1.5,bin_1\n",
            ',',
        )
        .unwrap();
        let bins = build_assignment(&records, &spades_contigs()).unwrap();

        assert_eq!(bins.node_count(), 3);
        assert_eq!(bins.catalog().labels().collect::<Vec<_>>(), ["bin_1", "bin_2"]);
        assert_eq!(bins.bin_of(0), Some(1));
        assert_eq!(bins.bin_of(1), Some(0));
        assert_eq!(bins.bin_of(2), None);
    }

    #[test]
    fn test_build_assignment_unknown_contig() {
        let records = parse_binning_text("NODE_9_length_10_cov_1.0,bin_1\n", ',').unwrap();
        let err = build_assignment(&records, &spades_contigs()).unwrap_err();
        assert!(matches!(err, ParseError::UnknownContig(name) if name.starts_with("NODE_9")));
    }

    #[test]
    fn test_build_assignment_conflicting_bins() {
        let records = parse_binning_text(
            "NODE_1_length_500_cov_2.0,bin_1\nNODE_1_length_500_cov_2.0,bin_2\n",
            ',',
        )
        .unwrap();
        let err = build_assignment(&records, &spades_contigs()).unwrap_err();
        assert!(matches!(err, ParseError::ConflictingBins { ref contig, .. } if contig.starts_with("NODE_1")));
    }

    #[test]
    fn test_repeated_row_is_harmless() {
        let records = parse_binning_text(
            "NODE_1_length_500_cov_2.0,bin_1\nNODE_1_length_500_cov_2.0,bin_1\n",
            ',',
        )
        .unwrap();
        let bins = build_assignment(&records, &spades_contigs()).unwrap();
        assert_eq!(bins.assigned_count(), 1);
    }

    #[test]
    fn test_read_initial_binning() {
        let mut temp = NamedTempFile::with_suffix(".csv").unwrap();
        temp.write_all(b"NODE_3_length_100_cov_1.0;7\n").unwrap();
        temp.flush().unwrap();

        let bins = read_initial_binning(temp.path(), ';', &spades_contigs()).unwrap();
        assert_eq!(bins.bin_of(2), Some(0));
        assert_eq!(bins.catalog().label(0), Some("7"));
    }
}
