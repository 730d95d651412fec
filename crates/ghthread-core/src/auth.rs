// SPDX-License-Identifier: Apache-2.0

//! Token provider abstraction.
//!
//! Hosts decide where the GitHub token comes from; the CLI resolves it from
//! the environment or the GitHub CLI.

use secrecy::SecretString;

/// Provides the GitHub credential used for API calls.
pub trait TokenProvider: Send + Sync {
    /// Retrieves the GitHub API token.
    ///
    /// Returns `None` if no token is available from any source.
    fn github_token(&self) -> Option<SecretString>;
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    struct StaticProvider(Option<&'static str>);

    impl TokenProvider for StaticProvider {
        fn github_token(&self) -> Option<SecretString> {
            self.0.map(SecretString::from)
        }
    }

    #[test]
    fn test_provider_with_token() {
        let provider = StaticProvider(Some("ghp_test"));
        let token = provider.github_token().unwrap();
        assert_eq!(token.expose_secret(), "ghp_test");
    }

    #[test]
    fn test_provider_without_token() {
        assert!(StaticProvider(None).github_token().is_none());
    }
}
