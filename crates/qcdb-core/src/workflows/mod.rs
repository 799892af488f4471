//! # Workflows Module
//!
//! High-level entry points built on the engine.
//!
//! - **Dataset Assembly** ([`dataset`]) - descriptor columns collected from
//!   finished stages, major/minor pairing and CSV output
//! - **Pipeline Steps** ([`pipeline`]) - composite operations that prepare the
//!   raw-model stages or drive the complete xtb chain

pub mod dataset;
pub mod pipeline;
