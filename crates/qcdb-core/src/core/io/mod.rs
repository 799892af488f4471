//! Coordinate file formats and the conversions between them.
//!
//! Stage inputs are synthesized from a structure's raw model or from an
//! upstream stage's output. This module reads geometries out of Gaussian
//! inputs, Gaussian logs and XYZ files, and renders them into new Gaussian
//! inputs through a model-file template.

pub mod convert;
pub mod gaussian_log;
pub mod gjf;
pub mod traits;
pub mod xyz;
