//! autoss command-line library exports.
//!
//! - `cli`: argument parsing with clap
//! - `logging`: console + file tracing subscriber for one run
//! - `commands`: settings, model, tagger and store wiring

pub mod cli;
pub mod commands;
pub mod logging;

pub use cli::{Cli, PassArg};
pub use commands::run;
