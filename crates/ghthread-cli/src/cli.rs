// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for ghthread.
//!
//! Uses clap's derive API with noun-verb subcommands.

use std::io::IsTerminal;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Extended help text for the generate subcommand with shell-specific examples.
const COMPLETION_GENERATE_HELP: &str = r#"EXAMPLES

  bash
    Add to ~/.bashrc or ~/.bash_profile:
      eval "$(ghthread completion generate bash)"

  zsh
    Generate completion file:
      mkdir -p ~/.zsh/completions
      ghthread completion generate zsh > ~/.zsh/completions/_ghthread

  fish
    Generate completion file:
      ghthread completion generate fish > ~/.config/fish/completions/ghthread.fish
"#;

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Suppress non-essential output (spinners)
    pub quiet: bool,
    /// Whether stderr is a terminal
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(quiet: bool) -> Self {
        Self {
            quiet,
            is_tty: std::io::stderr().is_terminal(),
        }
    }

    /// Returns true if the spinner should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && !self.quiet
    }
}

/// ghthread - render a GitHub issue or pull request as one document.
///
/// Fetches the description, comments, reviews, inline review comments,
/// commits, timeline events, CI status and diff, and prints them as a single
/// chronologically ordered markdown document.
#[derive(Parser)]
#[command(name = "ghthread")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Suppress non-essential output (spinner) and most logging
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable debug-level logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Render an issue or pull request as markdown on stdout
    Dump {
        /// Issue or PR reference (URL, owner/repo#123, or bare number with --repo)
        reference: String,

        /// Repository for bare numbers (owner/repo)
        #[arg(long, short = 'r')]
        repo: Option<String>,

        /// Render the full diff only below this many changed lines
        #[arg(long)]
        diff_threshold: Option<u64>,

        /// Show timestamps in UTC instead of local time
        #[arg(long)]
        utc: bool,

        /// Do not download images into the scratch directory
        #[arg(long)]
        no_images: bool,
    },

    /// Inspect GitHub authentication
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Generate shell completion scripts
    #[command(subcommand)]
    Completion(CompletionCommand),
}

/// Authentication subcommands
#[derive(Subcommand)]
pub enum AuthCommand {
    /// Show where the GitHub token comes from and the remaining API quota
    Status,
}

/// Completion subcommands
#[derive(Subcommand)]
pub enum CompletionCommand {
    /// Print a completion script to stdout
    #[command(after_long_help = COMPLETION_GENERATE_HELP)]
    Generate {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_dump_flags() {
        let cli = Cli::try_parse_from([
            "ghthread",
            "dump",
            "42",
            "-r",
            "octocat/hello",
            "--diff-threshold",
            "100",
            "--utc",
            "--no-images",
        ])
        .unwrap();
        match cli.command {
            Commands::Dump {
                reference,
                repo,
                diff_threshold,
                utc,
                no_images,
            } => {
                assert_eq!(reference, "42");
                assert_eq!(repo.as_deref(), Some("octocat/hello"));
                assert_eq!(diff_threshold, Some(100));
                assert!(utc);
                assert!(no_images);
            }
            _ => panic!("expected dump"),
        }
    }
}
