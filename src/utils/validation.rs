//! Centralized validation and helper functions.

use std::path::{Path, PathBuf};

/// Maximum number of contigs allowed in a single assembly
pub const MAX_CONTIGS: usize = 20_000_000;

/// Output prefixes become part of file names
pub const MAX_PREFIX_LENGTH: usize = 128;

/// Check if adding another contig would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new contig.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_contig_limit(contigs.len()).is_some() {
///     return Err(...);
/// }
/// contigs.insert(name); // Safe to add
/// ```
#[must_use]
pub fn check_contig_limit(count: usize) -> Option<String> {
    if count >= MAX_CONTIGS {
        Some(format!(
            "Too many contigs: adding another would exceed maximum of {MAX_CONTIGS}"
        ))
    } else {
        None
    }
}

/// Input validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Prefix too long: exceeds {MAX_PREFIX_LENGTH} characters")]
    PrefixTooLong,
    #[error("Invalid prefix: contains path separators or invalid characters")]
    InvalidPrefix,
    #[error("Unsupported delimiter '{0}': use comma, semicolon, tab or space")]
    InvalidDelimiter(String),
    #[error("Input file not found: {}", .0.display())]
    MissingFile(PathBuf),
}

/// Validate an output file prefix.
///
/// The prefix is prepended to every output file name, so it may not contain
/// path separators, `..` or control characters. An empty prefix is allowed.
/// Characters other than ASCII alphanumerics, `.`, `-` and `_` are dropped.
///
/// # Examples
///
/// ```
/// use graphbin::utils::validation::validate_prefix;
///
/// assert_eq!(validate_prefix("sample1_").unwrap(), "sample1_");
/// assert_eq!(validate_prefix("").unwrap(), "");
/// assert!(validate_prefix("../out").is_err());
/// ```
///
/// # Errors
///
/// Returns `ValidationError::PrefixTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidPrefix` if it contains invalid characters.
pub fn validate_prefix(prefix: &str) -> Result<String, ValidationError> {
    if prefix.is_empty() {
        return Ok(String::new());
    }

    if prefix.len() > MAX_PREFIX_LENGTH {
        return Err(ValidationError::PrefixTooLong);
    }

    if prefix.contains("..") || prefix.contains('/') || prefix.contains('\\') {
        return Err(ValidationError::InvalidPrefix);
    }

    if prefix.contains('\0') || prefix.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidPrefix);
    }

    let sanitized = prefix
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect::<String>();

    if sanitized.is_empty() || sanitized.starts_with('.') {
        return Err(ValidationError::InvalidPrefix);
    }

    Ok(sanitized)
}

/// Parse a column delimiter given as a character or by name.
///
/// Accepts `,` / `comma`, `;` / `semicolon`, a tab / `\t` / `tab`, and
/// ` ` / `space`.
///
/// # Errors
///
/// Returns `ValidationError::InvalidDelimiter` for anything else.
pub fn parse_delimiter(value: &str) -> Result<char, ValidationError> {
    match value {
        "," | "comma" => Ok(','),
        ";" | "semicolon" => Ok(';'),
        "\t" | "\\t" | "tab" => Ok('\t'),
        " " | "space" => Ok(' '),
        other => Err(ValidationError::InvalidDelimiter(other.to_string())),
    }
}

/// Check that an input path names an existing regular file
///
/// # Errors
///
/// Returns `ValidationError::MissingFile` if it does not.
pub fn require_file(path: &Path) -> Result<(), ValidationError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ValidationError::MissingFile(path.to_path_buf()))
    }
}

/// File-name-safe form of a bin label
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}
