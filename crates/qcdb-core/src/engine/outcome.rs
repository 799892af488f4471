use crate::core::models::status::StageStatus;
use std::fmt;

/// A structure that could not be processed, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub structure: String,
    pub reason: String,
}

impl Failure {
    pub fn new(structure: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.structure, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// Inputs were already complete and regeneration was not forced.
    AlreadyDone,
    /// The prerequisite stage has not finished; nothing was touched.
    PrerequisitePending {
        prerequisite: String,
        status: StageStatus,
    },
    Generated {
        written: Vec<String>,
        failed: Vec<Failure>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Inputs are incomplete; nothing was launched.
    NotReady { status: StageStatus },
    AlreadyDone,
    Ran {
        succeeded: Vec<String>,
        failed: Vec<Failure>,
    },
    /// The batch was handed to the scheduler, which accepted it or not.
    Submitted { accepted: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Harvesting only applies while outputs are being collected (status 2).
    Skipped { status: StageStatus },
    Harvested { moved: usize, job_dirs: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationCheck {
    NotReady { status: StageStatus },
    /// Every log terminated normally and the sentinel file was written.
    AllNormal { checked: usize },
    Abnormal { files: Vec<String> },
}

impl fmt::Display for GenerateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDone => write!(f, "inputs already complete"),
            Self::PrerequisitePending {
                prerequisite,
                status,
            } => write!(f, "waiting for '{}' (status {})", prerequisite, status),
            Self::Generated { written, failed } => {
                write!(f, "{} inputs written, {} failed", written.len(), failed.len())
            }
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady { status } => write!(f, "not ready (status {})", status),
            Self::AlreadyDone => write!(f, "outputs already complete"),
            Self::Ran { succeeded, failed } => {
                write!(f, "{} succeeded, {} failed", succeeded.len(), failed.len())
            }
            Self::Submitted { accepted: true } => write!(f, "submitted"),
            Self::Submitted { accepted: false } => write!(f, "submission rejected"),
        }
    }
}

impl fmt::Display for HarvestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped { status } => write!(f, "nothing to harvest (status {})", status),
            Self::Harvested { moved, job_dirs } => {
                write!(f, "{} files moved from {} job directories", moved, job_dirs)
            }
        }
    }
}

impl fmt::Display for TerminationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady { status } => write!(f, "not ready (status {})", status),
            Self::AllNormal { checked } => write!(f, "all {} logs terminated normally", checked),
            Self::Abnormal { files } => write!(f, "{} abnormal: {}", files.len(), files.join(", ")),
        }
    }
}
