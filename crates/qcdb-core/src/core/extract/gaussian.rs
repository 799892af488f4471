use super::{ExtractError, last_marker, line_at, parse_number, token_value, token_value_from_end};

const ARCHIVE_END: &str = "@";
const FREE_ENERGY: &str = "Sum of electronic and thermal Free Energies=";
const FREE_ENERGY_CORRECTION: &str = "Thermal correction to Gibbs Free Energy=";
const MAXIMUM_FORCE: &str = "Maximum Force";
const RMS_FORCE: &str = "RMS     Force";
const MULLIKEN: &str = "Mulliken charges:";
const NORMAL_TERMINATION: &str = "Normal termination";
const TERMINATION_WINDOW: usize = 9;

/// SCF energy from the archive block at the end of a Gaussian log.
///
/// The archive entry `HF=<value>` is `\`-separated and wrapped at a fixed
/// width, so the entry can be split across two lines in three ways: the value
/// continues on the next line, the line ends in `HF` and the next one starts
/// with `=<value>`, or the next line starts with `F=<value>`.
pub fn scf_energy(lines: &[String]) -> Result<f64, ExtractError> {
    let end = match lines.iter().rposition(|l| l.contains(ARCHIVE_END)) {
        Some(at) => at + 1,
        None => lines.len().saturating_sub(1),
    };
    let archive = &lines[..end];

    for i in (0..archive.len()).rev() {
        let line = archive[i].as_str();
        if line.contains("HF=") {
            let fields: Vec<&str> = line.split('\\').collect();
            let (last, rest) = fields
                .split_last()
                .ok_or_else(|| ExtractError::MissingMarker("HF=".to_string()))?;
            if let Some(value) = last.split_once("HF=").map(|(_, v)| v) {
                let next = line_at(archive, i + 1)?;
                let continuation = next.split('\\').next().unwrap_or("").trim();
                return parse_number(&format!("{}{}", value.trim(), continuation), i);
            }
            let value = rest
                .iter()
                .rev()
                .find_map(|f| f.split_once("HF=").map(|(_, v)| v))
                .ok_or_else(|| ExtractError::MissingMarker("HF=".to_string()))?;
            return parse_number(value, i);
        }
        if line.trim_end().ends_with("HF") {
            let next = line_at(archive, i + 1)?;
            let field = next.split('\\').next().unwrap_or("").trim();
            let value = field.strip_prefix('=').unwrap_or(field);
            return parse_number(value, i + 1);
        }
        if line.contains("F=-") {
            let field = line.split('\\').next().unwrap_or("").trim();
            let value = field
                .split_once("F=")
                .map(|(_, v)| v)
                .ok_or_else(|| ExtractError::MissingMarker("F=".to_string()))?;
            return parse_number(value, i);
        }
    }
    Err(ExtractError::MissingMarker("HF=".to_string()))
}

/// Sum of electronic and thermal free energies (Eh).
pub fn free_energy(lines: &[String]) -> Result<f64, ExtractError> {
    token_value_from_end(lines, last_marker(lines, FREE_ENERGY)?, 0)
}

/// Thermal correction to the Gibbs free energy (Eh).
pub fn free_energy_correction(lines: &[String]) -> Result<f64, ExtractError> {
    token_value_from_end(lines, last_marker(lines, FREE_ENERGY_CORRECTION)?, 0)
}

pub fn maximum_force(lines: &[String]) -> Result<f64, ExtractError> {
    token_value(lines, last_marker(lines, MAXIMUM_FORCE)?, 2)
}

/// RMS force of the last convergence table: the first `RMS     Force` line
/// after the last `Maximum Force` line.
pub fn rms_force(lines: &[String]) -> Result<f64, ExtractError> {
    let max_line = last_marker(lines, MAXIMUM_FORCE)?;
    let rms_line = lines[max_line..]
        .iter()
        .position(|l| l.contains(RMS_FORCE))
        .map(|offset| max_line + offset)
        .ok_or_else(|| ExtractError::MissingMarker(RMS_FORCE.to_string()))?;
    token_value(lines, rms_line, 2)
}

/// Mulliken charge of a 1-based atom from the last population analysis.
pub fn mulliken_charge(lines: &[String], atom: usize) -> Result<f64, ExtractError> {
    if atom == 0 {
        return Err(ExtractError::LineOutOfRange(0));
    }
    let header = last_marker(lines, MULLIKEN)?;
    token_value(lines, header + 1 + atom, 2)
}

pub fn normal_termination(lines: &[String]) -> bool {
    lines
        .iter()
        .rev()
        .take(TERMINATION_WINDOW)
        .any(|l| l.contains(NORMAL_TERMINATION))
}
