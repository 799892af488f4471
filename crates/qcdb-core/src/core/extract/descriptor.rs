use super::{ExtractError, fchk, gaussian, read_lines, xtb};
use crate::core::models::stage::OutputFlavor;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// A scalar property that can be collected from a stage's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Descriptor {
    /// Single-point (total/SCF) energy.
    Spe,
    Grad,
    Gap,
    EHomo,
    ELumo,
    ForceRms,
    ForceMax,
    /// Gibbs free energy.
    FreeEnergy,
    /// Thermal correction to the Gibbs free energy.
    FreeEnergyCorrection,
    /// Per-atom partial charge.
    Charge,
    /// Per-bond Wiberg bond order.
    Wbo,
}

/// Which atom or bond a per-atom or per-bond descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Global,
    Atom(usize),
    Bond(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown descriptor '{0}'")]
pub struct UnknownDescriptor(pub String);

impl Descriptor {
    pub const ALL: [Descriptor; 11] = [
        Self::Spe,
        Self::Grad,
        Self::Gap,
        Self::EHomo,
        Self::ELumo,
        Self::ForceRms,
        Self::ForceMax,
        Self::FreeEnergy,
        Self::FreeEnergyCorrection,
        Self::Charge,
        Self::Wbo,
    ];

    /// The name used on the command line and in column headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spe => "SPE",
            Self::Grad => "Grad",
            Self::Gap => "Gap",
            Self::EHomo => "EHOMO",
            Self::ELumo => "ELUMO",
            Self::ForceRms => "ForceRMS",
            Self::ForceMax => "ForceMax",
            Self::FreeEnergy => "G",
            Self::FreeEnergyCorrection => "Gcorr",
            Self::Charge => "charge",
            Self::Wbo => "wbo",
        }
    }

    pub fn is_per_atom(self) -> bool {
        self == Self::Charge
    }

    pub fn is_per_bond(self) -> bool {
        self == Self::Wbo
    }

    pub fn is_available_for(self, flavor: OutputFlavor) -> bool {
        match flavor {
            OutputFlavor::Xtb => matches!(
                self,
                Self::Spe | Self::Grad | Self::Gap | Self::EHomo | Self::ELumo | Self::Charge | Self::Wbo
            ),
            OutputFlavor::Gaussian => !matches!(self, Self::Grad | Self::Wbo),
        }
    }

    /// Extension of the output files this descriptor is read from.
    pub fn source_extension(self, flavor: OutputFlavor) -> &'static str {
        match (flavor, self) {
            (OutputFlavor::Xtb, Self::Charge) => "charges",
            (OutputFlavor::Xtb, Self::Wbo) => "wbo",
            (OutputFlavor::Gaussian, Self::EHomo | Self::ELumo | Self::Gap) => "fchk",
            _ => "log",
        }
    }

    /// Applies the extractor for this descriptor to the lines of one file.
    ///
    /// Callers are expected to have checked [`Descriptor::is_available_for`];
    /// an unavailable combination yields `MissingMarker`.
    pub fn extract_lines(
        self,
        flavor: OutputFlavor,
        target: Target,
        lines: &[String],
    ) -> Result<f64, ExtractError> {
        match (flavor, self, target) {
            (OutputFlavor::Xtb, Self::Spe, _) => xtb::total_energy(lines),
            (OutputFlavor::Xtb, Self::Grad, _) => xtb::gradient_norm(lines),
            (OutputFlavor::Xtb, Self::Gap, _) => xtb::gap(lines),
            (OutputFlavor::Xtb, Self::EHomo, _) => xtb::homo(lines),
            (OutputFlavor::Xtb, Self::ELumo, _) => xtb::lumo(lines),
            (OutputFlavor::Xtb, Self::Charge, Target::Atom(atom)) => xtb::charge(lines, atom),
            (OutputFlavor::Xtb, Self::Wbo, Target::Bond(a, b)) => xtb::bond_order(lines, a, b),
            (OutputFlavor::Gaussian, Self::Spe, _) => gaussian::scf_energy(lines),
            (OutputFlavor::Gaussian, Self::FreeEnergy, _) => gaussian::free_energy(lines),
            (OutputFlavor::Gaussian, Self::FreeEnergyCorrection, _) => {
                gaussian::free_energy_correction(lines)
            }
            (OutputFlavor::Gaussian, Self::ForceMax, _) => gaussian::maximum_force(lines),
            (OutputFlavor::Gaussian, Self::ForceRms, _) => gaussian::rms_force(lines),
            (OutputFlavor::Gaussian, Self::Charge, Target::Atom(atom)) => {
                gaussian::mulliken_charge(lines, atom)
            }
            (OutputFlavor::Gaussian, Self::EHomo, _) => Ok(fchk::frontier_orbitals(lines)?.homo),
            (OutputFlavor::Gaussian, Self::ELumo, _) => Ok(fchk::frontier_orbitals(lines)?.lumo),
            (OutputFlavor::Gaussian, Self::Gap, _) => Ok(fchk::frontier_orbitals(lines)?.gap()),
            _ => Err(ExtractError::MissingMarker(format!(
                "{} for {:?} output ({:?})",
                self, flavor, target
            ))),
        }
    }

    pub fn extract_file(
        self,
        flavor: OutputFlavor,
        target: Target,
        path: &Path,
    ) -> Result<f64, ExtractError> {
        let lines = read_lines(path)?;
        self.extract_lines(flavor, target, &lines)
    }

    /// Column header for this descriptor of `stage`.
    pub fn column_name(self, stage: &str, target: Target) -> String {
        match target {
            Target::Global => format!("{}_{}", stage, self),
            Target::Atom(atom) => format!("{}_{}-{}", stage, self, atom),
            Target::Bond(a, b) => format!("{}_{}-{}-{}", stage, self, a, b),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Descriptor {
    type Err = UnknownDescriptor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDescriptor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn names_parse_back_to_descriptors() {
        for d in Descriptor::ALL {
            assert_eq!(d.as_str().parse::<Descriptor>().unwrap(), d);
        }
        assert_eq!("spe".parse::<Descriptor>(), Err(UnknownDescriptor("spe".into())));
    }

    #[test]
    fn availability_follows_program() {
        assert!(Descriptor::Grad.is_available_for(OutputFlavor::Xtb));
        assert!(!Descriptor::Grad.is_available_for(OutputFlavor::Gaussian));
        assert!(Descriptor::Wbo.is_available_for(OutputFlavor::Xtb));
        assert!(!Descriptor::Wbo.is_available_for(OutputFlavor::Gaussian));
        assert!(!Descriptor::FreeEnergy.is_available_for(OutputFlavor::Xtb));
        assert!(Descriptor::FreeEnergyCorrection.is_available_for(OutputFlavor::Gaussian));
        assert!(Descriptor::Charge.is_available_for(OutputFlavor::Gaussian));
    }

    #[test]
    fn source_extension_selects_file_kind() {
        assert_eq!(Descriptor::Charge.source_extension(OutputFlavor::Xtb), "charges");
        assert_eq!(Descriptor::Charge.source_extension(OutputFlavor::Gaussian), "log");
        assert_eq!(Descriptor::Gap.source_extension(OutputFlavor::Gaussian), "fchk");
        assert_eq!(Descriptor::Gap.source_extension(OutputFlavor::Xtb), "log");
    }

    #[test]
    fn column_names_encode_targets() {
        assert_eq!(Descriptor::Spe.column_name("xtb-mod", Target::Global), "xtb-mod_SPE");
        assert_eq!(Descriptor::Charge.column_name("DFT-mod", Target::Atom(3)), "DFT-mod_charge-3");
        assert_eq!(Descriptor::Wbo.column_name("xtb-mod", Target::Bond(1, 5)), "xtb-mod_wbo-1-5");
    }

    #[test]
    fn extraction_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m1-major-xtb.log");
        fs::write(&path, "          | TOTAL ENERGY              -42.061220458930 Eh   |\n").unwrap();
        let first = Descriptor::Spe.extract_file(OutputFlavor::Xtb, Target::Global, &path).unwrap();
        let second = Descriptor::Spe.extract_file(OutputFlavor::Xtb, Target::Global, &path).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn unavailable_combination_is_an_error() {
        let lines = vec!["anything".to_string()];
        assert!(Descriptor::Wbo
            .extract_lines(OutputFlavor::Gaussian, Target::Bond(1, 2), &lines)
            .is_err());
        assert!(Descriptor::Charge
            .extract_lines(OutputFlavor::Xtb, Target::Global, &lines)
            .is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = Descriptor::Spe
            .extract_file(OutputFlavor::Gaussian, Target::Global, &dir.path().join("none.log"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
