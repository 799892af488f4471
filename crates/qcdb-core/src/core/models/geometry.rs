use crate::core::utils::elements;
use std::collections::BTreeSet;

/// Cartesian coordinates of one structure, kept as the original text lines.
///
/// Each line reads `<element> <x> <y> <z>`, where the element may be a symbol,
/// an atomic number, or a symbol with an isotope/fragment annotation. The
/// lines are passed through unchanged so that no precision is lost between
/// program formats.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Geometry {
    pub atom_lines: Vec<String>,
    /// The `charge multiplicity` line of a Gaussian input, when known.
    pub charge_multiplicity: Option<String>,
}

impl Geometry {
    pub fn new(atom_lines: Vec<String>) -> Self {
        Self {
            atom_lines,
            charge_multiplicity: None,
        }
    }

    pub fn with_charge_multiplicity(mut self, line: impl Into<String>) -> Self {
        self.charge_multiplicity = Some(line.into());
        self
    }

    pub fn atom_count(&self) -> usize {
        self.atom_lines.len()
    }

    /// Element symbols present in the geometry, with atomic numbers resolved.
    pub fn elements(&self) -> BTreeSet<String> {
        self.atom_lines
            .iter()
            .filter_map(|line| line.split_whitespace().next())
            .map(|token| {
                if token.chars().all(|c| c.is_ascii_digit()) {
                    elements::symbol(token).unwrap_or(token).to_string()
                } else {
                    token.to_string()
                }
            })
            .collect()
    }
}
