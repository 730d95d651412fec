// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # ghthread core
//!
//! Fetches every artifact of a GitHub issue or pull request and renders them
//! as one chronologically ordered markdown document.
//!
//! This crate provides:
//! - Reference parsing and a GitHub data source over `octocrab`
//! - Concurrent fetch orchestration with soft-failing enrichment
//! - Timeline grouping and a two-pass chronological merge
//! - Link hydration and image localization
//! - Diff verbosity and CI status policy for pull requests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ghthread_core::{TokenProvider, dump_thread, load_config};
//! use secrecy::SecretString;
//!
//! struct EnvToken;
//!
//! impl TokenProvider for EnvToken {
//!     fn github_token(&self) -> Option<SecretString> {
//!         std::env::var("GH_TOKEN").ok().map(SecretString::from)
//!     }
//! }
//!
//! # async fn example() -> ghthread_core::Result<()> {
//! let config = load_config()?;
//! let markdown = dump_thread(&EnvToken, "rust-lang/rust#1", None, &config).await?;
//! println!("{markdown}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`fetch`] - Concurrent fetch orchestration
//! - [`grouping`] - Timeline event grouping
//! - [`merge`] - Chronological merge
//! - [`render`] - Per-kind rendering
//! - [`rewrite`] - Link hydration and image localization
//! - [`policy`] - Diff and CI status policy
//! - [`document`] - Document assembly
//! - [`github`] - References, data source, authentication

// ============================================================================
// Authentication
// ============================================================================

pub use auth::TokenProvider;

// ============================================================================
// Error Handling
// ============================================================================

pub use error::ThreadError;

/// Convenience Result type for ghthread operations.
///
/// This is equivalent to `std::result::Result<T, ThreadError>`.
pub type Result<T> = std::result::Result<T, ThreadError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AppConfig, FetchConfig, GitHubConfig, RenderConfig, ScratchConfig, config_dir,
    config_file_path, load_config,
};

// ============================================================================
// GitHub Integration
// ============================================================================

pub use github::auth::{TokenSource, resolve_token};
pub use github::client::OctocrabSource;
pub use github::ratelimit::{RateLimitStatus, check_rate_limit};
pub use github::source::ThreadSource;
pub use github::{ResourceKind, ResourceRef, parse_reference};

// ============================================================================
// Pipeline
// ============================================================================

pub use document::render_thread;
pub use fetch::{FetchOptions, FetchedThread, fetch_thread};
pub use grouping::group_events;
pub use merge::render_timeline;
pub use policy::{CheckStatus, DiffMode, choose_diff_mode};
pub use render::RenderContext;
pub use rewrite::ContentRewriter;

// ============================================================================
// Retry Logic
// ============================================================================

pub use retry::{rate_limit_backoff, render_with_retry};

// ============================================================================
// Platform-Agnostic Facade
// ============================================================================

pub use facade::dump_thread;

// ============================================================================
// Modules
// ============================================================================

pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod facade;
pub mod fetch;
pub mod github;
pub mod grouping;
pub mod merge;
pub mod model;
pub mod policy;
pub mod render;
pub mod retry;
pub mod rewrite;
pub mod scratch;
pub mod utils;
