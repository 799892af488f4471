use crate::core::extract::descriptor::{Descriptor, Target};
use crate::core::extract::legacy_value;
use crate::core::models::stage::Stage;
use crate::core::models::status::StageStatus;
use crate::core::models::structure::Structure;
use crate::engine::context::PipelineContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tracker::StageTracker;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub const DATA_CSV: &str = "data.csv";
pub const PAIR_DATA_CSV: &str = "pair_data.csv";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Stage '{stage}' is not complete (status {status})")]
    StageIncomplete { stage: String, status: StageStatus },

    #[error("Descriptor '{descriptor}' is not available for stage '{stage}'")]
    UnavailableDescriptor {
        stage: String,
        descriptor: Descriptor,
    },

    #[error("Column '{column}' has {found} values but the database has {expected} structures")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Structures '{major}' and '{minor}' do not form a pair")]
    PairMismatch { major: String, minor: String },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// One descriptor series: a value per structure, in structure order.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Descriptor columns keyed by structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    structures: Vec<String>,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn new(structures: Vec<String>) -> Self {
        Self {
            structures,
            columns: Vec::new(),
        }
    }

    pub fn structures(&self) -> &[String] {
        &self.structures
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Adds a column, replacing an existing one of the same name in place.
    pub fn insert(&mut self, column: Column) -> Result<(), DatasetError> {
        if column.values.len() != self.structures.len() {
            return Err(DatasetError::ColumnLength {
                column: column.name,
                expected: self.structures.len(),
                found: column.values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Pairs structure `2i` (major) with `2i + 1` (minor).
    ///
    /// Both names must agree once their last `suffix_len` characters are
    /// removed. A trailing structure without a partner is ignored.
    pub fn pair(&self, suffix_len: usize) -> Result<PairDataset, DatasetError> {
        let mut bases = Vec::with_capacity(self.structures.len() / 2);
        for chunk in self.structures.chunks_exact(2) {
            let major = Structure::new(chunk[0].as_str());
            let minor = Structure::new(chunk[1].as_str());
            if major.base_name(suffix_len) != minor.base_name(suffix_len) {
                return Err(DatasetError::PairMismatch {
                    major: chunk[0].clone(),
                    minor: chunk[1].clone(),
                });
            }
            bases.push(major.base_name(suffix_len).to_string());
        }
        if self.structures.len() % 2 == 1 {
            warn!(
                structure = self.structures.last().map(String::as_str).unwrap_or_default(),
                "Ignoring unpaired trailing structure."
            );
        }

        let columns = self
            .columns
            .iter()
            .map(|c| PairColumn {
                name: c.name.clone(),
                major: c.values.iter().step_by(2).take(bases.len()).copied().collect(),
                minor: c.values.iter().skip(1).step_by(2).take(bases.len()).copied().collect(),
            })
            .collect();
        Ok(PairDataset { bases, columns })
    }

    /// Writes one row per structure; missing values become the sentinel.
    pub fn write_csv(&self, path: &Path) -> Result<(), DatasetError> {
        let header = std::iter::once("structure".to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect();
        let rows = self.structures.iter().enumerate().map(|(i, s)| {
            std::iter::once(s.clone())
                .chain(self.columns.iter().map(|c| format_value(c.values[i])))
                .collect::<Vec<String>>()
        });
        write_table(path, header, rows)
    }
}

/// A descriptor split into its major and minor halves.
#[derive(Debug, Clone, PartialEq)]
pub struct PairColumn {
    pub name: String,
    pub major: Vec<Option<f64>>,
    pub minor: Vec<Option<f64>>,
}

impl PairColumn {
    /// `major - minor`, absent when either side is. The CSV diff instead
    /// subtracts the sentinel-substituted values.
    pub fn diff(&self) -> Vec<Option<f64>> {
        self.major
            .iter()
            .zip(&self.minor)
            .map(|(a, b)| Some((*a)? - (*b)?))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairDataset {
    bases: Vec<String>,
    columns: Vec<PairColumn>,
}

impl PairDataset {
    pub fn bases(&self) -> &[String] {
        &self.bases
    }

    pub fn columns(&self) -> &[PairColumn] {
        &self.columns
    }

    /// Writes `<name>_major`, `<name>_minor` and `<name>_diff` for every column.
    pub fn write_csv(&self, path: &Path) -> Result<(), DatasetError> {
        let mut header = vec!["structure".to_string()];
        for c in &self.columns {
            header.push(format!("{}_major", c.name));
            header.push(format!("{}_minor", c.name));
            header.push(format!("{}_diff", c.name));
        }
        let rows = self.bases.iter().enumerate().map(|(i, base)| {
            let mut row = vec![base.clone()];
            for c in &self.columns {
                row.push(format_value(c.major[i]));
                row.push(format_value(c.minor[i]));
                // The written diff is taken after sentinel substitution.
                let diff = legacy_value(c.major[i]) - legacy_value(c.minor[i]);
                row.push(format!("{:.6}", diff));
            }
            row
        });
        write_table(path, header, rows)
    }
}

/// Shortest round-trip text with a signed, two-digit exponent (`3e-06`, `1e+16`).
fn format_value(value: Option<f64>) -> String {
    let value = legacy_value(value);
    if value.is_nan() {
        return "nan".to_string();
    }
    let text = format!("{:?}", value);
    match text.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => text,
    }
}

fn write_table(
    path: &Path,
    header: Vec<String>,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DatasetError::Io {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    let csv_err = |e: csv::Error| DatasetError::Csv {
        path: path.display().to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(&header).map_err(csv_err)?;
    let mut count = 0;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
        count += 1;
    }
    writer.flush().map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    info!(rows = count, "Wrote {}", path.display());
    Ok(())
}

/// Which descriptors to collect, and from where.
///
/// An empty stage list selects every stage whose outputs are complete; an
/// empty descriptor list selects every descriptor the stage supports.
/// Per-atom and per-bond descriptors produce one column per requested atom or
/// bond, and none when no atoms or bonds are given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectRequest {
    pub stages: Vec<String>,
    pub descriptors: Vec<Descriptor>,
    pub atoms: Vec<usize>,
    pub bonds: Vec<(usize, usize)>,
}

/// Builds a [`Dataset`] from the outputs of finished stages.
pub struct DatasetAssembler<'a> {
    ctx: &'a PipelineContext,
    dataset: Dataset,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self {
            ctx,
            dataset: Dataset::new(ctx.structures.names()),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    #[instrument(skip_all, name = "collect")]
    pub fn collect(
        &mut self,
        request: &CollectRequest,
        reporter: &ProgressReporter,
    ) -> Result<(), DatasetError> {
        let tracker = StageTracker::new(self.ctx);
        let stages: Vec<&Stage> = if request.stages.is_empty() {
            self.ctx
                .catalog
                .stages()
                .iter()
                .filter(|s| tracker.status(s).is_complete())
                .collect()
        } else {
            request
                .stages
                .iter()
                .map(|name| self.ctx.stage(name))
                .collect::<Result<_, _>>()?
        };

        for stage in stages {
            let status = tracker.status(stage);
            if !status.is_complete() {
                return Err(DatasetError::StageIncomplete {
                    stage: stage.name.clone(),
                    status,
                });
            }
            let descriptors: Vec<Descriptor> = if request.descriptors.is_empty() {
                Descriptor::ALL
                    .into_iter()
                    .filter(|d| d.is_available_for(stage.flavor()))
                    .collect()
            } else {
                request.descriptors.clone()
            };
            for descriptor in descriptors {
                for target in targets(descriptor, request) {
                    let column = self.extract_column(stage, descriptor, target, reporter)?;
                    self.dataset.insert(column)?;
                }
            }
        }
        info!(columns = self.dataset.columns.len(), "Collected descriptors.");
        Ok(())
    }

    fn extract_column(
        &self,
        stage: &Stage,
        descriptor: Descriptor,
        target: Target,
        reporter: &ProgressReporter,
    ) -> Result<Column, DatasetError> {
        let flavor = stage.flavor();
        let unavailable = || DatasetError::UnavailableDescriptor {
            stage: stage.name.clone(),
            descriptor,
        };
        if !descriptor.is_available_for(flavor) {
            return Err(unavailable());
        }
        let artifact = stage
            .output_with_extension(descriptor.source_extension(flavor))
            .ok_or_else(unavailable)?;

        let files = output_files(&artifact.dir(&self.ctx.stage_dir(stage)), &artifact.tail)?;
        let name = descriptor.column_name(&stage.name, target);
        reporter.begin(format!("Extracting {}", name), files.len() as u64);
        let values = files
            .iter()
            .map(|path| {
                let value = descriptor.extract_file(flavor, target, path);
                reporter.report(Progress::TaskIncrement);
                value
                    .map_err(|e| debug!("{}: {}", path.display(), e))
                    .ok()
            })
            .collect();
        reporter.finish();
        Ok(Column { name, values })
    }
}

fn targets(descriptor: Descriptor, request: &CollectRequest) -> Vec<Target> {
    if descriptor.is_per_atom() {
        request.atoms.iter().map(|&a| Target::Atom(a)).collect()
    } else if descriptor.is_per_bond() {
        request.bonds.iter().map(|&(a, b)| Target::Bond(a, b)).collect()
    } else {
        vec![Target::Global]
    }
}

/// Files in `dir` ending in `tail`, sorted by file name.
fn output_files(dir: &Path, tail: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let io_err = |e| DatasetError::Io {
        path: dir.display().to_string(),
        source: e,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(tail));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
