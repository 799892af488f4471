#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: String },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// One structure of the current task could not be processed.
    StructureFailed { structure: String, reason: String },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Starts a phase with a known number of steps.
    pub fn begin(&self, name: impl Into<String>, total_steps: u64) {
        self.report(Progress::PhaseStart { name: name.into() });
        self.report(Progress::TaskStart { total_steps });
    }

    pub fn fail(&self, structure: &str, reason: &str) {
        self.report(Progress::StructureFailed {
            structure: structure.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn finish(&self) {
        self.report(Progress::TaskFinish);
        self.report(Progress::PhaseFinish);
    }
}
