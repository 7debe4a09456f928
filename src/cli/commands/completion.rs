//! completion command - Generate shell completion scripts

use crate::cli::args::{Cli, Shell};
use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;

/// Generate shell completion scripts on stdout.
pub fn completion(shell: Shell) -> Result<()> {
    let target = match shell {
        Shell::Bash => clap_complete::Shell::Bash,
        Shell::Zsh => clap_complete::Shell::Zsh,
        Shell::Fish => clap_complete::Shell::Fish,
        Shell::PowerShell => clap_complete::Shell::PowerShell,
    };

    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(target, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
