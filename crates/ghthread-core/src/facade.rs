// SPDX-License-Identifier: Apache-2.0

//! Single entry point for hosts.
//!
//! Resolves credentials through a [`TokenProvider`], builds the GitHub
//! client, and runs the fetch-and-render operation under the rate-limit
//! retry loop.

use tracing::instrument;

use crate::Result;
use crate::auth::TokenProvider;
use crate::config::AppConfig;
use crate::document::render_thread;
use crate::error::ThreadError;
use crate::fetch::FetchOptions;
use crate::github::client::OctocrabSource;
use crate::github::parse_reference;
use crate::retry::render_with_retry;
use crate::scratch::prepare_scratch_dir;
use crate::utils::{local_offset, utc_offset};

/// Renders the issue or pull request named by `reference` as markdown.
///
/// # Arguments
///
/// * `provider` - Token provider for GitHub credentials
/// * `reference` - URL, `owner/repo#N`, or bare number
/// * `repo_context` - `owner/repo` used for bare numbers
/// * `config` - Effective configuration (CLI overrides already applied)
///
/// # Errors
///
/// Returns an error if:
/// - No GitHub token is available (`NotAuthenticated`)
/// - The reference cannot be parsed (`InvalidReference`)
/// - The thread does not exist (`NotFound`)
/// - Rate limiting persists after all retries (`RateLimited`)
/// - The metadata response cannot be decoded (`Parse`)
#[instrument(skip(provider, config))]
pub async fn dump_thread(
    provider: &dyn TokenProvider,
    reference: &str,
    repo_context: Option<&str>,
    config: &AppConfig,
) -> Result<String> {
    let token = provider
        .github_token()
        .ok_or(ThreadError::NotAuthenticated)?;
    let resource = parse_reference(reference, repo_context)?;
    let source = OctocrabSource::new(&token, &config.github)?;
    let offset = if config.render.utc {
        utc_offset()
    } else {
        local_offset()
    };

    let source = &source;
    let resource = &resource;
    render_with_retry(&config.fetch, || async move {
        let image_dir = if config.fetch.images {
            Some(prepare_scratch_dir(&config.scratch.base_dir(), resource)?)
        } else {
            None
        };
        let options = FetchOptions::builder()
            .diff_threshold(config.render.diff_threshold)
            .maybe_image_dir(image_dir)
            .max_concurrency(config.fetch.max_concurrency)
            .build();
        render_thread(source, resource, &options, offset).await
    })
    .await
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    struct NoToken;

    impl TokenProvider for NoToken {
        fn github_token(&self) -> Option<SecretString> {
            None
        }
    }

    struct FakeToken;

    impl TokenProvider for FakeToken {
        fn github_token(&self) -> Option<SecretString> {
            Some(SecretString::from("test-token"))
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_not_authenticated() {
        let err = dump_thread(&NoToken, "o/r#1", None, &AppConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_invalid_reference_fails_before_network() {
        let err = dump_thread(&FakeToken, "not a reference", None, &AppConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ThreadError::InvalidReference { .. }));
    }
}
