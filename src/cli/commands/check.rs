//! check command - Run safety checks against a proposed promotion
//!
//! # Flow
//!
//! 1. Derive the proposed (and optional baseline) edge sets
//! 2. Assemble the enabled checks from flags and config
//! 3. Gather size data when the size check is enabled
//! 4. Run every check and report all failures
//!
//! # Example
//!
//! ```bash
//! cip check --baseline main/manifests --proposed pr/manifests \
//!     --max-image-size 2000 --fetch-sizes
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use serde_json::json;

use super::load_edges;
use crate::checks::{CheckReport, CheckSuite, DigestSizes, ImageRemovalCheck, ImageSizeCheck};
use crate::cli::Context;
use crate::core::config::Config;
use crate::core::edges::EdgeSet;
use crate::core::manifest::ManifestError;
use crate::sizes::{fetch_sizes, RegistrySizeLookup, StaticSizes};
use crate::ui::output::{self, Verbosity};

/// Options for the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub proposed: PathBuf,
    pub baseline: Option<PathBuf>,
    pub max_image_size: Option<u64>,
    pub sizes: Option<PathBuf>,
    pub fetch_sizes: bool,
    pub concurrency: Option<usize>,
    pub removal_check: bool,
    pub json: bool,
}

/// Run the check command.
///
/// Returns an error if any check fails, after reporting every failure.
pub fn check(ctx: &Context, opts: &CheckOptions) -> Result<()> {
    let verbosity = ctx.verbosity();
    let config = Config::load(ctx.config.as_deref())?;
    if let Some(path) = config.loaded_from() {
        output::debug(format!("Using config {}", path.display()), verbosity);
    }

    let proposed = load_edges(ctx, &opts.proposed)?;
    let baseline = opts
        .baseline
        .as_deref()
        .map(|path| load_baseline(ctx, path))
        .transpose()?;

    let mut suite = CheckSuite::new();

    if opts.removal_check && config.image_removal() {
        if baseline.is_some() {
            suite = suite.with_baseline_check(ImageRemovalCheck);
        } else {
            output::debug("No baseline given; skipping image removal check", verbosity);
        }
    }

    if let Some(max_image_size) = opts.max_image_size.or(config.max_image_size_mb()) {
        let sizes = gather_sizes(opts, &config, &proposed, verbosity)?;
        suite = suite.with_standalone_check(
            ImageSizeCheck::new(max_image_size)
                .with_edges(proposed.clone())
                .with_sizes(sizes),
        );
    }

    if suite.is_empty() {
        output::warn(
            "No checks enabled; pass --baseline or --max-image-size",
            verbosity,
        );
    }

    let report = suite.run(baseline.as_ref(), &proposed);

    if opts.json {
        output::json(&report_json(&report))?;
    } else if !report.passed() {
        for line in report.to_string().lines() {
            output::error(line);
        }
    }

    if !report.passed() {
        bail!("{} check(s) failed", report.failures.len());
    }

    if !opts.json {
        output::success(
            format!(
                "All checks passed ({} check(s), {} edge(s))",
                report.ran.len(),
                proposed.len()
            ),
            verbosity,
        );
    }
    Ok(())
}

/// Derive the baseline edge set.
///
/// A baseline directory holding no manifests is an empty baseline.
fn load_baseline(ctx: &Context, path: &Path) -> Result<EdgeSet> {
    match load_edges(ctx, path) {
        Err(err)
            if matches!(
                err.downcast_ref::<ManifestError>(),
                Some(ManifestError::Empty { .. })
            ) =>
        {
            output::debug(
                format!("No manifests under {}; using an empty baseline", path.display()),
                ctx.verbosity(),
            );
            Ok(EdgeSet::new())
        }
        other => other,
    }
}

/// Collect per-digest sizes from a file or from the source registries.
fn gather_sizes(
    opts: &CheckOptions,
    config: &Config,
    proposed: &EdgeSet,
    verbosity: Verbosity,
) -> Result<DigestSizes> {
    if let Some(path) = &opts.sizes {
        let table = StaticSizes::from_json_file(path)?;
        output::debug(
            format!("Loaded {} size(s) from {}", table.sizes().len(), path.display()),
            verbosity,
        );
        return Ok(table.sizes().clone());
    }

    if !opts.fetch_sizes {
        bail!("The image size check needs size data; pass --sizes <FILE> or --fetch-sizes");
    }

    let mut lookup = RegistrySizeLookup::new();
    if let Some(endpoint) = config.registry_endpoint() {
        lookup = lookup.with_endpoint(endpoint);
    }
    let concurrency = opts.concurrency.unwrap_or_else(|| config.concurrency());
    output::debug(
        format!("Fetching sizes with concurrency {}", concurrency),
        verbosity,
    );

    let rt = tokio::runtime::Runtime::new()?;
    let sizes = rt
        .block_on(fetch_sizes(Arc::new(lookup), proposed, concurrency))
        .context("Failed to fetch image sizes")?;
    Ok(sizes)
}

/// Machine-readable form of a check report.
fn report_json(report: &CheckReport) -> serde_json::Value {
    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|failure| {
            json!({
                "check": failure.check,
                "message": failure.error.to_string().trim_end(),
                "error": failure.error,
            })
        })
        .collect();

    json!({
        "passed": report.passed(),
        "ran": report.ran,
        "skipped": report.skipped,
        "failures": failures,
    })
}
