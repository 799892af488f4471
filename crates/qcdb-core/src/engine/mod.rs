//! # Engine Module
//!
//! Drives a database through its calculation stages. Nothing here keeps state
//! between calls: every decision starts from what is on disk, so an interrupted
//! batch is resumed simply by issuing the same command again.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - database layout, program names and defaults
//! - **Context** ([`context`]) - configuration, stage catalog and structure set
//! - **Status Tracking** ([`tracker`]) - per-stage status and missing-file reports
//! - **Input Generation** ([`generator`]) - stage inputs synthesized from raw
//!   models or from the outputs of a prerequisite stage
//! - **Execution** ([`runner`], [`launcher`]) - synchronous xtb runs and batch
//!   submission through an injectable [`launcher::Launcher`]
//! - **Post-processing** ([`harvest`]) - collecting scheduler output and
//!   checking Gaussian terminations
//! - **Progress Monitoring** ([`progress`]) - callback-based progress events
//! - **Error Handling** ([`error`]) - engine-level error type

pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod harvest;
pub mod launcher;
pub mod outcome;
pub mod progress;
pub mod runner;
pub mod tracker;
