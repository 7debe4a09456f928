//! cli
//!
//! Command-line interface layer for cip.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and manifests
//! - Delegate to the core and checks, then format results
//!
//! # Architecture
//!
//! The CLI layer is thin. Edge derivation and checks are pure library
//! calls; this layer owns all I/O and all output.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;
use std::path::PathBuf;

use crate::ui::output::Verbosity;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file path
    pub config: Option<PathBuf>,
    /// Enable debug output
    pub debug: bool,
    /// Minimal output
    pub quiet: bool,
}

impl Context {
    /// Output verbosity derived from the flags.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
