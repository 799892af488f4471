//! Descriptor extraction from calculation output files.
//!
//! Every extractor works on the lines of one text file, locates a fixed marker
//! (the last occurrence wherever a restarted job can repeat it) and parses a
//! fixed whitespace-delimited token. Failures are reported as
//! [`ExtractError`]; callers that must keep iterating over a batch store them
//! as `None`, and tabular output renders `None` as [`SENTINEL`].

pub mod descriptor;
pub mod fchk;
pub mod gaussian;
pub mod xtb;

use std::path::Path;
use thiserror::Error;

/// Value written to tabular output in place of a missing or invalid descriptor.
///
/// This is a compatibility convention only: a genuine value of `-1.0` cannot
/// be told apart from a failure once written.
pub const SENTINEL: f64 = -1.0;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Marker '{0}' not found")]
    MissingMarker(String),
    #[error("Line {line} has no token at position {index}")]
    MissingToken { line: usize, index: usize },
    #[error("Invalid number '{value}' on line {line}")]
    InvalidNumber { line: usize, value: String },
    #[error("Line {0} is past the end of the file")]
    LineOutOfRange(usize),
}

pub fn legacy_value(value: Option<f64>) -> f64 {
    value.unwrap_or(SENTINEL)
}

pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, ExtractError> {
    crate::core::utils::text::read_lines(path).map_err(|e| ExtractError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Line at `index` (0-based); errors report it 1-based.
pub(crate) fn line_at(lines: &[String], index: usize) -> Result<&str, ExtractError> {
    lines
        .get(index)
        .map(String::as_str)
        .ok_or(ExtractError::LineOutOfRange(index + 1))
}

pub(crate) fn parse_number(text: &str, line_index: usize) -> Result<f64, ExtractError> {
    let trimmed = text.trim();
    // Fortran-style exponents (1.0D-03) appear in some Gaussian sections.
    trimmed
        .replace(['D', 'd'], "E")
        .parse()
        .map_err(|_| ExtractError::InvalidNumber {
            line: line_index + 1,
            value: trimmed.to_string(),
        })
}

/// Parses the token at `index` of line `line_index`.
pub(crate) fn token_value(lines: &[String], line_index: usize, index: usize) -> Result<f64, ExtractError> {
    let line = line_at(lines, line_index)?;
    let token = crate::core::utils::text::nth_token(line, index).ok_or(ExtractError::MissingToken {
        line: line_index + 1,
        index,
    })?;
    parse_number(token, line_index)
}

/// Parses the token at `index` counted from the end (0 = last).
pub(crate) fn token_value_from_end(
    lines: &[String],
    line_index: usize,
    index: usize,
) -> Result<f64, ExtractError> {
    let line = line_at(lines, line_index)?;
    let token = crate::core::utils::text::nth_token_from_end(line, index).ok_or(
        ExtractError::MissingToken {
            line: line_index + 1,
            index,
        },
    )?;
    parse_number(token, line_index)
}

pub(crate) fn last_marker(lines: &[String], marker: &str) -> Result<usize, ExtractError> {
    crate::core::utils::text::rfind_containing(lines, marker)
        .ok_or_else(|| ExtractError::MissingMarker(marker.to_string()))
}

pub(crate) fn first_marker(lines: &[String], marker: &str) -> Result<usize, ExtractError> {
    crate::core::utils::text::find_containing(lines, marker)
        .ok_or_else(|| ExtractError::MissingMarker(marker.to_string()))
}

#[cfg(test)]
pub(crate) fn lines_of(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_value_maps_none_to_sentinel() {
        assert_eq!(legacy_value(None), -1.0);
        assert_eq!(legacy_value(Some(-42.5)), -42.5);
    }

    #[test]
    fn parse_number_accepts_fortran_exponent() {
        assert_eq!(parse_number(" 1.5D-02 ", 0).unwrap(), 0.015);
        assert!(matches!(
            parse_number("abc", 4),
            Err(ExtractError::InvalidNumber { line: 5, .. })
        ));
    }

    #[test]
    fn token_helpers_report_missing_tokens() {
        let lines = lines_of("a b 3.0");
        assert_eq!(token_value(&lines, 0, 2).unwrap(), 3.0);
        assert_eq!(token_value_from_end(&lines, 0, 0).unwrap(), 3.0);
        assert!(matches!(
            token_value(&lines, 0, 5),
            Err(ExtractError::MissingToken { line: 1, index: 5 })
        ));
        assert!(matches!(token_value(&lines, 3, 0), Err(ExtractError::LineOutOfRange(4))));
    }
}
