use super::{ExtractError, first_marker, line_at, parse_number, token_value_from_end};

const ELECTRONS: &str = "Number of electrons";
const ALPHA_ENERGIES: &str = "Alpha Orbital Energies ";
const VALUES_PER_ROW: usize = 5;

/// Frontier orbital energies (Eh) from a formatted checkpoint file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierOrbitals {
    pub homo: f64,
    pub lumo: f64,
}

impl FrontierOrbitals {
    /// HOMO minus LUMO, the sign convention of the original dataset.
    pub fn gap(&self) -> f64 {
        self.homo - self.lumo
    }
}

/// Number of occupied orbitals for `electrons` electrons (odd counts round up).
pub fn occupied_orbitals(electrons: usize) -> usize {
    electrons.div_ceil(2)
}

/// Line offset from the header and token position of 1-based orbital `k`.
///
/// The energies are tabulated five per line starting on the line after the
/// header. A column of zero means the last value of the previous row.
fn orbital_position(k: usize) -> (usize, Option<usize>) {
    let row = k / VALUES_PER_ROW;
    let col = k % VALUES_PER_ROW;
    if col == 0 {
        (row, None)
    } else {
        (row + 1, Some(col - 1))
    }
}

fn orbital_energy(lines: &[String], header: usize, k: usize) -> Result<f64, ExtractError> {
    let (offset, column) = orbital_position(k);
    let index = header + offset;
    match column {
        None => token_value_from_end(lines, index, 0),
        Some(col) => {
            let line = line_at(lines, index)?;
            let token = line
                .split_whitespace()
                .nth(col)
                .ok_or(ExtractError::MissingToken { line: index + 1, index: col })?;
            parse_number(token, index)
        }
    }
}

pub fn frontier_orbitals(lines: &[String]) -> Result<FrontierOrbitals, ExtractError> {
    let electrons_line = first_marker(lines, ELECTRONS)?;
    let electrons = token_value_from_end(lines, electrons_line, 0)?;
    if electrons < 0.0 || electrons.fract() != 0.0 {
        return Err(ExtractError::InvalidNumber {
            line: electrons_line + 1,
            value: electrons.to_string(),
        });
    }
    let occupied = occupied_orbitals(electrons as usize);

    let header = first_marker(lines, ALPHA_ENERGIES)?;
    Ok(FrontierOrbitals {
        homo: orbital_energy(lines, header, occupied)?,
        lumo: orbital_energy(lines, header, occupied + 1)?,
    })
}

#[cfg(test)]
mod tests {
    use super::super::lines_of;
    use super::*;

    fn fchk(electrons: usize) -> String {
        format!(
            "m1-major-gau
SP        RB3LYP                                                      6-31G(d)
Number of atoms                            I                3
Number of electrons                        I               {electrons}
Alpha Orbital Energies                     R   N=          15
 -1.01000000E+01 -2.02000000E+00 -3.03000000E+00 -4.04000000E+00 -5.05000000E+00
 -6.06000000E+00 -7.07000000E+00 -8.08000000E+00 -9.09000000E+00 -1.00000000E-01
  1.10000000E-01  1.20000000E-01  1.30000000E-01  1.40000000E-01  1.50000000E-01
Alpha MO coefficients                      R   N=         225
"
        )
    }

    #[test]
    fn occupied_orbitals_round_up() {
        assert_eq!(occupied_orbitals(10), 5);
        assert_eq!(occupied_orbitals(11), 6);
        assert_eq!(occupied_orbitals(0), 0);
    }

    #[test]
    fn position_arithmetic_wraps_at_row_end() {
        assert_eq!(orbital_position(5), (1, None));
        assert_eq!(orbital_position(6), (2, Some(0)));
        assert_eq!(orbital_position(1), (1, Some(0)));
        assert_eq!(orbital_position(10), (2, None));
    }

    #[test]
    fn ten_electrons_read_homo_from_end_of_first_row() {
        let lines = lines_of(&fchk(10));
        let mo = frontier_orbitals(&lines).unwrap();
        assert_eq!(mo.homo, -5.05);
        assert_eq!(mo.lumo, -6.06);
        assert_eq!(mo.gap(), -5.05 - -6.06);
    }

    #[test]
    fn odd_electron_count_uses_singly_occupied_orbital() {
        let lines = lines_of(&fchk(13));
        let mo = frontier_orbitals(&lines).unwrap();
        assert_eq!(mo.homo, -7.07);
        assert_eq!(mo.lumo, -8.08);
    }

    #[test]
    fn homo_on_row_boundary_reads_last_value() {
        let lines = lines_of(&fchk(20));
        let mo = frontier_orbitals(&lines).unwrap();
        assert_eq!(mo.homo, -0.1);
        assert_eq!(mo.lumo, 0.11);
    }

    #[test]
    fn missing_orbital_block_is_an_error() {
        let lines = lines_of("Number of electrons                        I               10\n");
        assert!(matches!(
            frontier_orbitals(&lines),
            Err(ExtractError::MissingMarker(_))
        ));
    }

    #[test]
    fn orbital_beyond_table_is_an_error() {
        let lines = lines_of(&fchk(40));
        assert!(frontier_orbitals(&lines).is_err());
    }
}
