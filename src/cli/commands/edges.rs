//! edges command - Print the promotion edges implied by manifests

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::load_all;
use crate::cli::Context;
use crate::core::edges::derive_edges;
use crate::ui::output;

/// Derive and print the edge set for all manifests under `paths`.
///
/// Manifests from every path are derived together, so an edge declared in
/// more than one place is printed once.
pub fn edges(ctx: &Context, paths: &[PathBuf], json: bool) -> Result<()> {
    let manifests = load_all(ctx, paths)?;
    let edges = derive_edges(&manifests).context("Invalid manifests")?;

    if json {
        let edges: Vec<_> = edges.iter().collect();
        output::json(&edges)?;
        return Ok(());
    }

    let verbosity = ctx.verbosity();
    for edge in &edges {
        output::print(edge, verbosity);
    }
    output::debug(format!("{} edge(s)", edges.len()), verbosity);
    Ok(())
}
