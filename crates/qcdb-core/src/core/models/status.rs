use std::fmt;

/// Completion state of a stage directory, derived from the filesystem.
///
/// The variants are ordered: a stage only ever moves forward through them as
/// files are added, and comparisons such as `status >= InputsComplete` are the
/// gates used by the generator and the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum StageStatus {
    NoDirectory = 0,
    DirectoryExists = 1,
    InputsComplete = 2,
    OutputsComplete = 3,
}

impl StageStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NoDirectory),
            1 => Some(Self::DirectoryExists),
            2 => Some(Self::InputsComplete),
            3 => Some(Self::OutputsComplete),
            _ => None,
        }
    }

    pub fn inputs_complete(self) -> bool {
        self >= Self::InputsComplete
    }

    pub fn is_complete(self) -> bool {
        self == Self::OutputsComplete
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NoDirectory => "no directory",
            Self::DirectoryExists => "directory exists",
            Self::InputsComplete => "inputs complete",
            Self::OutputsComplete => "outputs complete",
        };
        write!(f, "{} ({})", self.code(), label)
    }
}
