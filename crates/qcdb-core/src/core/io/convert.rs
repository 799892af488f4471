use super::gaussian_log::GaussianLogFile;
use super::gjf::{GjfFile, GjfTemplate};
use super::traits::{CoordinateError, CoordinateFile};
use super::xyz::XyzFile;
use crate::core::models::geometry::Geometry;
use crate::core::models::stage::Conversion;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to read coordinates from '{path}': {source}")]
    Read {
        path: String,
        source: CoordinateError,
    },
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("Conversion {0:?} requires a template")]
    MissingTemplate(Conversion),
}

/// File name up to the first `.`, used as title and checkpoint name.
fn stem(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .and_then(|n| n.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

fn read<F: CoordinateFile<Error = CoordinateError>>(source: &Path) -> Result<Geometry, ConvertError> {
    F::read_from_path(source).map_err(|e| ConvertError::Read {
        path: source.display().to_string(),
        source: e,
    })
}

/// Produces `output` from `source` according to `conversion`.
///
/// Gaussian inputs are titled and checkpointed after the output file's stem;
/// XYZ files derived from a Gaussian input carry the source stem as comment.
pub fn convert(
    conversion: Conversion,
    source: &Path,
    output: &Path,
    template: Option<&GjfTemplate>,
) -> Result<(), ConvertError> {
    let write_err = |e: std::io::Error| ConvertError::Write {
        path: output.display().to_string(),
        source: e,
    };

    match conversion {
        Conversion::Copy => {
            fs::copy(source, output).map_err(|e| ConvertError::Read {
                path: source.display().to_string(),
                source: CoordinateError::Io(e),
            })?;
        }
        Conversion::GjfToXyz => {
            let geometry = read::<GjfFile>(source)?;
            XyzFile::write_to_path(&geometry, &stem(source), output).map_err(write_err)?;
        }
        Conversion::GjfToGjf | Conversion::LogToGjf | Conversion::XyzToGjf => {
            let template = template.ok_or(ConvertError::MissingTemplate(conversion))?;
            let geometry = match conversion {
                Conversion::GjfToGjf => read::<GjfFile>(source)?,
                Conversion::LogToGjf => read::<GaussianLogFile>(source)?,
                _ => read::<XyzFile>(source)?,
            };
            let name = stem(output);
            fs::write(output, template.render(&geometry, &name, &name)).map_err(write_err)?;
        }
    }
    Ok(())
}
