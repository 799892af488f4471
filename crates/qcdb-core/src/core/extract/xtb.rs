use super::{ExtractError, last_marker, line_at, parse_number, token_value, token_value_from_end};

const TOTAL_ENERGY: &str = "TOTAL ENERGY";
const GRADIENT_NORM: &str = "GRADIENT NORM";
const HOMO_LUMO_GAP: &str = "HOMO-LUMO GAP";
const HOMO: &str = "(HOMO)";
const LUMO: &str = "(LUMO)";

/// Total energy in Eh from the last `TOTAL ENERGY` summary line.
pub fn total_energy(lines: &[String]) -> Result<f64, ExtractError> {
    token_value(lines, last_marker(lines, TOTAL_ENERGY)?, 3)
}

pub fn gradient_norm(lines: &[String]) -> Result<f64, ExtractError> {
    token_value(lines, last_marker(lines, GRADIENT_NORM)?, 3)
}

/// HOMO-LUMO gap in eV.
pub fn gap(lines: &[String]) -> Result<f64, ExtractError> {
    token_value(lines, last_marker(lines, HOMO_LUMO_GAP)?, 3)
}

/// HOMO energy in eV, the second-to-last token of the orbital table row.
pub fn homo(lines: &[String]) -> Result<f64, ExtractError> {
    token_value_from_end(lines, last_marker(lines, HOMO)?, 1)
}

pub fn lumo(lines: &[String]) -> Result<f64, ExtractError> {
    token_value_from_end(lines, last_marker(lines, LUMO)?, 1)
}

/// Partial charge of a 1-based atom from an xtb `charges` file.
pub fn charge(lines: &[String], atom: usize) -> Result<f64, ExtractError> {
    let index = atom.checked_sub(1).ok_or(ExtractError::LineOutOfRange(0))?;
    parse_number(line_at(lines, index)?, index)
}

/// Wiberg bond order between two 1-based atoms from an xtb `wbo` file.
///
/// The file lists each bonded pair once, lower index first. Pairs without a
/// record have no bond and yield `0.0`.
pub fn bond_order(lines: &[String], a: usize, b: usize) -> Result<f64, ExtractError> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    for (i, line) in lines.iter().enumerate() {
        let mut tokens = line.split_whitespace();
        let first = tokens.next().and_then(|t| t.parse::<usize>().ok());
        let second = tokens.next().and_then(|t| t.parse::<usize>().ok());
        if first == Some(lo) && second == Some(hi) {
            return token_value(lines, i, 2);
        }
    }
    Ok(0.0)
}
