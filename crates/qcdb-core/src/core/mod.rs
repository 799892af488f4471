//! # Core Module
//!
//! Fundamental building blocks shared by the engine and the workflows.
//!
//! - **Models** ([`models`]) - structures, stage descriptors, stage status and the
//!   stage catalog
//! - **File I/O** ([`io`]) - reading coordinates from gjf, xyz and Gaussian log
//!   files and rendering Gaussian inputs from model templates
//! - **Extraction** ([`extract`]) - parsers that pull scalar descriptors out of
//!   xtb logs, Gaussian logs and formatted checkpoint files
//! - **Utilities** ([`utils`]) - element tables and line-oriented text helpers

pub mod extract;
pub mod io;
pub mod models;
pub mod utils;
