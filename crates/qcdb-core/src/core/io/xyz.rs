use super::traits::{CoordinateError, CoordinateFile, collect_lines};
use crate::core::models::geometry::Geometry;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

/// A single-structure XYZ file: atom count, comment line, atom lines.
pub struct XyzFile;

impl CoordinateFile for XyzFile {
    type Error = CoordinateError;

    fn read_from(reader: &mut impl BufRead) -> Result<Geometry, Self::Error> {
        let lines = collect_lines(reader)?;
        let first = lines
            .first()
            .ok_or_else(|| CoordinateError::MissingSection("atom count".to_string()))?;
        let atom_count: usize = first.trim().parse().map_err(|_| CoordinateError::Parse {
            line: 1,
            message: format!("invalid atom count '{}'", first.trim()),
        })?;
        if lines.len() < atom_count + 2 {
            return Err(CoordinateError::Parse {
                line: lines.len(),
                message: format!(
                    "expected {} atom lines, found {}",
                    atom_count,
                    lines.len().saturating_sub(2)
                ),
            });
        }
        Ok(Geometry::new(lines[2..atom_count + 2].to_vec()))
    }
}

impl XyzFile {
    pub fn write_to(geometry: &Geometry, title: &str, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(writer, "{}", geometry.atom_count())?;
        writeln!(writer, "{}", title)?;
        for line in &geometry.atom_lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(
        geometry: &Geometry,
        title: &str,
        path: P,
    ) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(geometry, title, &mut writer)?;
        writer.flush()
    }
}
