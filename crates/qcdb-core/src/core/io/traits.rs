use crate::core::models::geometry::Geometry;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Missing required section: {0}")]
    MissingSection(String),
}

/// Defines the interface for reading coordinates out of a chemistry file.
///
/// Implementors extract the atom lines of a single structure from a
/// format-specific layout; writing is left to the individual formats because
/// most of them need more context than a geometry (templates, titles).
pub trait CoordinateFile {
    /// The error type for read operations.
    type Error: Error + From<io::Error>;

    /// Reads the geometry from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the expected sections are absent or malformed.
    fn read_from(reader: &mut impl BufRead) -> Result<Geometry, Self::Error>;

    /// Reads the geometry from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Geometry, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}

pub(crate) fn collect_lines(reader: &mut impl BufRead) -> io::Result<Vec<String>> {
    reader.lines().collect()
}

/// Indices of empty (whitespace-only) lines.
pub(crate) fn blank_line_indices(lines: &[String]) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}
