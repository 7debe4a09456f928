//! hash-files command - Generate a file manifest for a directory

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::files::generate_file_manifest;
use crate::ui::output;

/// Hash every file under `base_dir` and print the manifest.
pub fn hash_files(ctx: &Context, base_dir: &Path, json: bool) -> Result<()> {
    let manifest = generate_file_manifest(base_dir)?;
    output::debug(
        format!("Hashed {} file(s) under {}", manifest.files.len(), base_dir.display()),
        ctx.verbosity(),
    );

    if json {
        output::json(&manifest)?;
    } else {
        let text = toml::to_string_pretty(&manifest).context("Failed to render manifest")?;
        print!("{}", text);
    }
    Ok(())
}
