// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the ghthread CLI.

pub mod auth;
pub mod completion;
pub mod dump;

use std::time::Duration;

use anyhow::Result;
use ghthread_core::AppConfig;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{AuthCommand, Commands, CompletionCommand, OutputContext};

/// Creates a styled spinner on stderr (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, mut config: AppConfig) -> Result<()> {
    match command {
        Commands::Dump {
            reference,
            repo,
            diff_threshold,
            utc,
            no_images,
        } => {
            dump::apply_overrides(&mut config, diff_threshold, utc, no_images);
            let spinner = maybe_spinner(&ctx, "Fetching thread...");
            let result = dump::run(&reference, repo.as_deref(), &config).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            let document = result?;
            dump::print_document(&document)
        }

        Commands::Auth(auth_cmd) => match auth_cmd {
            AuthCommand::Status => {
                let spinner = maybe_spinner(&ctx, "Checking GitHub API quota...");
                let report = auth::run_status(&config).await;
                if let Some(s) = spinner {
                    s.finish_and_clear();
                }
                auth::print_status(&report);
                Ok(())
            }
        },

        Commands::Completion(CompletionCommand::Generate { shell }) => {
            completion::run_generate(shell)
        }
    }
}
