//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads configuration and manifests
//! 2. Calls the core to derive edges and run checks
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `check --fetch-sizes` queries registries over the network. Its handler
//! builds a tokio runtime and blocks on the lookups, so dispatch stays
//! synchronous.

mod check;
mod completion;
mod edges;
mod hash_files;

pub use check::{check, CheckOptions};
pub use completion::completion;
pub use edges::edges;
pub use hash_files::hash_files;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::edges::{derive_edges, EdgeSet};
use crate::core::manifest::{load_manifests, Manifest};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Edges { paths, json } => edges(ctx, &paths, json),
        Command::Check {
            proposed,
            baseline,
            max_image_size,
            sizes,
            fetch_sizes,
            concurrency,
            no_removal_check,
            json,
        } => check(
            ctx,
            &CheckOptions {
                proposed,
                baseline,
                max_image_size,
                sizes,
                fetch_sizes,
                concurrency: concurrency.and_then(|n| usize::try_from(n).ok()),
                removal_check: !no_removal_check,
                json,
            },
        ),
        Command::HashFiles { base_dir, json } => hash_files(ctx, &base_dir, json),
        Command::Completion { shell } => completion(shell),
    }
}

/// Load every manifest under each path, in argument order.
fn load_all(ctx: &Context, paths: &[PathBuf]) -> Result<Vec<Manifest>> {
    let mut manifests = Vec::new();
    for path in paths {
        let loaded = load_manifests(path)
            .with_context(|| format!("Failed to load manifests from {}", path.display()))?;
        output::debug(
            format!("Loaded {} manifest(s) from {}", loaded.len(), path.display()),
            ctx.verbosity(),
        );
        manifests.extend(loaded);
    }
    Ok(manifests)
}

/// Load manifests at `path` and derive their edge set.
fn load_edges(ctx: &Context, path: &Path) -> Result<EdgeSet> {
    let manifests = load_all(ctx, &[path.to_path_buf()])?;
    let edges = derive_edges(&manifests)
        .with_context(|| format!("Invalid manifests in {}", path.display()))?;
    output::debug(
        format!("Derived {} edge(s) from {}", edges.len(), path.display()),
        ctx.verbosity(),
    );
    Ok(edges)
}
