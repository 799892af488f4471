use super::traits::{CoordinateError, CoordinateFile, blank_line_indices, collect_lines};
use crate::core::models::geometry::Geometry;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A Gaussian input file (`.gjf`).
///
/// Layout: link-0 and route lines, blank, title, blank, `charge multiplicity`,
/// atom lines, blank, optional trailing sections (basis sets, ECPs, ...).
pub struct GjfFile;

impl CoordinateFile for GjfFile {
    type Error = CoordinateError;

    fn read_from(reader: &mut impl BufRead) -> Result<Geometry, Self::Error> {
        let lines = collect_lines(reader)?;
        let blanks = blank_line_indices(&lines);
        let Some(&second) = blanks.get(1) else {
            return Err(CoordinateError::MissingSection(
                "title section terminated by a blank line".to_string(),
            ));
        };

        let cm_index = second + 1;
        let charge_multiplicity = lines.get(cm_index).ok_or_else(|| {
            CoordinateError::MissingSection("charge and multiplicity line".to_string())
        })?;
        if charge_multiplicity.split_whitespace().count() < 2 {
            return Err(CoordinateError::Parse {
                line: cm_index + 1,
                message: format!("expected charge and multiplicity, found '{}'", charge_multiplicity),
            });
        }

        // Files without a trailing blank line end the coordinates at EOF.
        let end = blanks.get(2).copied().unwrap_or(lines.len());
        let atom_lines = lines[cm_index + 1..end].to_vec();
        if atom_lines.is_empty() {
            return Err(CoordinateError::MissingSection("atom lines".to_string()));
        }

        Ok(Geometry::new(atom_lines).with_charge_multiplicity(charge_multiplicity.clone()))
    }
}

/// A model Gaussian input whose geometry block is replaced per structure.
///
/// The template is split at its blank lines: `head` runs from the first line
/// through the `charge multiplicity` line, `tail` starts at the blank line that
/// closes the template's own geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GjfTemplate {
    head: Vec<String>,
    tail: Vec<String>,
}

impl GjfTemplate {
    pub fn from_lines(lines: Vec<String>) -> Result<Self, CoordinateError> {
        let blanks = blank_line_indices(&lines);
        if blanks.len() < 3 {
            return Err(CoordinateError::MissingSection(format!(
                "template needs at least three blank lines, found {}",
                blanks.len()
            )));
        }
        let head_end = blanks[1] + 2;
        if head_end > lines.len() {
            return Err(CoordinateError::MissingSection(
                "charge and multiplicity line".to_string(),
            ));
        }
        Ok(Self {
            head: lines[..head_end].to_vec(),
            tail: lines[blanks[2]..].to_vec(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, CoordinateError> {
        let file = File::open(path)?;
        let lines = collect_lines(&mut BufReader::new(file))?;
        Self::from_lines(lines)
    }

    /// Renders a complete input for `geometry`.
    ///
    /// The title line becomes `title`, the checkpoint is pointed at
    /// `<chk_name>.chk` and the charge/multiplicity of the geometry, if known,
    /// replaces the template's. A `<elements> 0` basis block followed by a
    /// `****` separator is adjusted to the elements actually present.
    pub fn render(&self, geometry: &Geometry, title: &str, chk_name: &str) -> String {
        let mut head = self.head.clone();
        let len = head.len();
        if let Some(cm) = &geometry.charge_multiplicity {
            head[len - 1] = cm.clone();
        }
        head[len - 3] = title.to_string();

        let chk_line = format!("%chk={}.chk", chk_name);
        if let Some(i) = head
            .iter()
            .position(|line| line.contains("%chk=") || line.contains('#'))
        {
            if head[i].contains("%chk=") {
                head[i] = chk_line;
            } else {
                head.insert(i, chk_line);
            }
        }

        let mut tail = self.tail.clone();
        adjust_basis_elements(&mut tail, &geometry.elements());

        let mut out = String::new();
        for line in head.iter().chain(&geometry.atom_lines).chain(&tail) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

fn adjust_basis_elements(tail: &mut [String], present: &BTreeSet<String>) {
    let mut basis_lines = Vec::new();
    let mut declared: BTreeSet<String> = BTreeSet::new();
    for j in 2..tail.len() {
        if !tail[j].contains("****") {
            continue;
        }
        let tokens: Vec<&str> = tail[j - 2].split_whitespace().collect();
        if tokens.last() == Some(&"0") {
            declared.extend(tokens[..tokens.len() - 1].iter().map(|t| t.to_string()));
            basis_lines.push(j - 2);
        }
    }
    let Some(&first) = basis_lines.first() else {
        return;
    };

    let mut elements: Vec<String> = tail[first]
        .split_whitespace()
        .map(str::to_string)
        .collect();
    elements.pop();

    let extra: BTreeSet<&String> = declared.difference(present).collect();
    if !extra.is_empty() {
        elements.retain(|e| !extra.contains(e));
    } else {
        elements.extend(present.difference(&declared).cloned());
    }
    elements.push("0".to_string());
    tail[first] = elements.join(" ");
}
