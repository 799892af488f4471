//! # qcdb Core Library
//!
//! Bookkeeping for a database of quantum-chemistry calculations: every molecular
//! model in a raw-model directory is pushed through a fixed set of calculation
//! stages (xtb optimizations, Gaussian DFT runs, single points), and the numeric
//! descriptors of the finished stages are gathered into tables for downstream
//! statistics.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Stage`,
//!   `StageCatalog`), coordinate-file conversions and the descriptor extractors
//!   that read xtb, Gaussian and formatted-checkpoint output.
//!
//! - **[`engine`]: The Logic Core.** The stage-status tracker, which derives the
//!   state of every stage from the filesystem alone, and the generator/runner that
//!   fills in missing inputs and drives the external programs through an explicit
//!   `Launcher` abstraction.
//!
//! - **[`workflows`]: The Public API.** Dataset assembly (descriptor columns,
//!   major/minor pairing, CSV output) and the composite pipeline steps.

pub mod core;
pub mod engine;
pub mod workflows;
