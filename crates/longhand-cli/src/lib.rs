//! Longhand CLI Library
//!
//! Terminal front end for the Longhand calculator engine: argument parsing,
//! configuration, styled output and command execution.

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    CalcArgs, Cli, ColorArg, Commands, DrawArgs, FactorArgs, HistoryArgs, ModeArg, ReplayArgs,
    SqrtArg, SqrtArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{render_lines, style_for, TerminalSurface};
pub use runner::{Report, Runner};
