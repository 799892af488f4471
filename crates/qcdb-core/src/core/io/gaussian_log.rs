use super::traits::{CoordinateError, CoordinateFile, collect_lines};
use crate::core::models::geometry::Geometry;
use std::io::BufRead;

/// A Gaussian output log, read for the last geometry it printed.
///
/// The atom count comes from the last `NAtoms=` line; the coordinates from the
/// table under the last `Input orientation:` header, whose rows start five
/// lines below it. The leading center number of every row is dropped, which
/// leaves `<atomic number> <type> <x> <y> <z>`.
pub struct GaussianLogFile;

const NATOMS_MARKER: &str = "NAtoms= ";
const ORIENTATION_MARKER: &str = "Input orientation:";
const ORIENTATION_OFFSET: usize = 5;

impl CoordinateFile for GaussianLogFile {
    type Error = CoordinateError;

    fn read_from(reader: &mut impl BufRead) -> Result<Geometry, Self::Error> {
        let lines = collect_lines(reader)?;

        let (natoms_line, natoms) = lines
            .iter()
            .enumerate()
            .rev()
            .find(|(_, line)| line.contains(NATOMS_MARKER))
            .ok_or_else(|| CoordinateError::MissingSection("NAtoms= line".to_string()))?;
        let atom_count: usize = natoms
            .split_whitespace()
            .nth(1)
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| CoordinateError::Parse {
                line: natoms_line + 1,
                message: format!("invalid atom count in '{}'", natoms.trim()),
            })?;

        let header = lines
            .iter()
            .rposition(|line| line.contains(ORIENTATION_MARKER))
            .ok_or_else(|| CoordinateError::MissingSection(ORIENTATION_MARKER.to_string()))?;
        let start = header + ORIENTATION_OFFSET;
        let end = start + atom_count;
        if end > lines.len() {
            return Err(CoordinateError::Parse {
                line: lines.len(),
                message: format!("orientation table shorter than {} atoms", atom_count),
            });
        }

        let atom_lines = lines[start..end]
            .iter()
            .map(|row| row.split_whitespace().skip(1).collect::<Vec<_>>().join("  "))
            .collect();
        Ok(Geometry::new(atom_lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn orientation(x: &str) -> String {
        format!(
            "                          Input orientation:
 ---------------------------------------------------------------------
 Center     Atomic      Atomic             Coordinates (Angstroms)
 Number     Number       Type             X           Y           Z
 ---------------------------------------------------------------------
      1          6           0        {x}    0.000000    0.000000
      2          8           0        0.000000    0.000000    1.200000
 ---------------------------------------------------------------------
"
        )
    }

    #[test]
    fn read_uses_last_orientation_block() {
        let text = format!(
            " NAtoms=      2 NActive=      2\n{}{}",
            orientation("0.100000"),
            orientation("0.200000")
        );
        let geom = GaussianLogFile::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(
            geom.atom_lines,
            vec![
                "6  0  0.200000  0.000000  0.000000",
                "8  0  0.000000  0.000000  1.200000"
            ]
        );
    }

    #[test]
    fn read_requires_atom_count() {
        let text = orientation("0.1");
        let err = GaussianLogFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, CoordinateError::MissingSection(_)));
    }

    #[test]
    fn read_rejects_truncated_table() {
        let text = format!(" NAtoms=      5\n{}", orientation("0.1"));
        let err = GaussianLogFile::read_from(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, CoordinateError::Parse { .. }));
    }
}
