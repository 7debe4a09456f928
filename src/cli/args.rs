//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of the default search
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cip - derive and validate container image promotions
#[derive(Parser, Debug)]
#[command(name = "cip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default search path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive and print the promotion edges for a set of manifests
    #[command(
        name = "edges",
        long_about = "Derive the promotion edges for one or more manifests.\n\n\
            Each path may be a manifest file (.toml or .json) or a directory, \
            which is searched recursively. Every (image, digest, tag, source, \
            destination) copy obligation is printed once, even when several \
            manifests declare it.",
        after_help = "\
EXAMPLES:
    # Show every copy a manifest directory implies
    cip edges manifests/

    # Machine-readable output
    cip edges manifests/ --json"
    )]
    Edges {
        /// Manifest files or directories
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        /// Print edges as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run safety checks against a proposed promotion
    #[command(
        name = "check",
        long_about = "Run pre-promotion safety checks.\n\n\
            The proposed manifests are expanded into promotion edges and \
            validated. With --baseline, images that disappear entirely \
            relative to the baseline are reported. With a maximum image size \
            (flag or config), every promoted digest must have a known size \
            no larger than the ceiling.\n\n\
            All checks run; every violation is reported. The command exits \
            non-zero if any check fails.",
        after_help = "\
EXAMPLES:
    # Compare a pull request's manifests against main
    cip check --baseline main/manifests --proposed pr/manifests

    # Enforce a 2GB ceiling using sizes from a file
    cip check --proposed manifests/ --max-image-size 2000 --sizes sizes.json

    # Query source registries for sizes
    cip check --proposed manifests/ --max-image-size 2000 --fetch-sizes"
    )]
    Check {
        /// Proposed manifest file or directory
        #[arg(long, value_name = "PATH")]
        proposed: PathBuf,

        /// Trusted baseline manifest file or directory
        #[arg(long, value_name = "PATH")]
        baseline: Option<PathBuf>,

        /// Size ceiling in decimal megabytes (overrides config)
        #[arg(long, value_name = "MB", value_parser = clap::value_parser!(u64).range(1..))]
        max_image_size: Option<u64>,

        /// JSON file mapping digests to sizes in bytes
        #[arg(long, value_name = "FILE", conflicts_with = "fetch_sizes")]
        sizes: Option<PathBuf>,

        /// Query each digest's source registry for its size
        #[arg(long)]
        fetch_sizes: bool,

        /// Maximum concurrent registry queries (overrides config)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
        concurrency: Option<u64>,

        /// Skip the image removal check even when a baseline is given
        #[arg(long)]
        no_removal_check: bool,

        /// Print the check report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Hash every file under a directory into a file manifest
    #[command(
        name = "hash-files",
        after_help = "\
EXAMPLES:
    # Print a TOML file manifest
    cip hash-files ./artifacts

    # As JSON
    cip hash-files ./artifacts --json"
    )]
    HashFiles {
        /// Directory containing the files to hash
        #[arg(value_name = "DIR")]
        base_dir: PathBuf,

        /// Print the manifest as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    cip completion bash > /etc/bash_completion.d/cip

    # Zsh
    cip completion zsh > \"${fpath[1]}/_cip\""
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
