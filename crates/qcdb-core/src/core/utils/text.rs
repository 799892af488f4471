use std::fs;
use std::io;
use std::path::Path;

pub fn read_lines(path: &Path) -> io::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?.lines().map(str::to_string).collect())
}

/// Index of the last line containing `marker`.
pub fn rfind_containing(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().rposition(|line| line.contains(marker))
}

/// Index of the first line containing `marker`.
pub fn find_containing(lines: &[String], marker: &str) -> Option<usize> {
    lines.iter().position(|line| line.contains(marker))
}

/// The whitespace-separated token at `index` (0-based).
pub fn nth_token(line: &str, index: usize) -> Option<&str> {
    line.split_whitespace().nth(index)
}

/// The whitespace-separated token at `index` counted from the end (0 = last).
pub fn nth_token_from_end(line: &str, index: usize) -> Option<&str> {
    line.split_whitespace().rev().nth(index)
}
