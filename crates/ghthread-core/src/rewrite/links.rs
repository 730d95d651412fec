// SPDX-License-Identifier: Apache-2.0

//! Link hydration.
//!
//! Bare issue and pull request URLs preceded by whitespace are replaced with
//! markdown links carrying the target's title. Title lookups run
//! concurrently and never fail the caller: a failed lookup maps the URL to
//! itself, which leaves the text untouched.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::{Captures, Regex};
use tracing::{debug, instrument};

use crate::github::source::ThreadSource;

/// Whitespace, then an issue or pull request URL (compiled once on first use).
static ISSUE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\s)(https://github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)/(?:issues|pull)/(\d+))",
    )
    .expect("issue URL pattern is valid")
});

/// An issue or pull request URL found in body text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinkTarget {
    /// The URL as written.
    pub url: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Issue or pull request number.
    pub number: u64,
}

/// A URL continues past the number if the next character is part of a path,
/// fragment or longer token.
fn continues(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '/' | '#' | '_' | '-'))
}

/// Finds the distinct whitespace-preceded issue and pull request URLs in `texts`.
#[must_use]
pub fn find_link_targets<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<LinkTarget> {
    let mut found = BTreeSet::new();
    for text in texts {
        for caps in ISSUE_URL.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if continues(text, whole.end()) {
                continue;
            }
            let Ok(number) = caps[5].parse() else { continue };
            found.insert(LinkTarget {
                url: caps[2].to_string(),
                owner: caps[3].to_string(),
                repo: caps[4].to_string(),
                number,
            });
        }
    }
    found.into_iter().collect()
}

/// Looks up every target's title, at most `limit` requests at a time.
///
/// The returned map has an entry for every target; failed lookups map the
/// URL to itself.
#[instrument(skip(source, targets), fields(count = targets.len()))]
pub async fn fetch_titles(
    source: &dyn ThreadSource,
    targets: Vec<LinkTarget>,
    limit: usize,
) -> HashMap<String, String> {
    stream::iter(targets)
        .map(|target| async move {
            let title = match source
                .issue_title(&target.owner, &target.repo, target.number)
                .await
            {
                Ok(title) if !title.trim().is_empty() => title,
                Ok(_) => target.url.clone(),
                Err(e) => {
                    debug!(url = %target.url, error = %e, "Title lookup failed");
                    target.url.clone()
                }
            };
            (target.url, title)
        })
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}

/// Replaces each whitespace-preceded URL that has a known title with
/// `[title](url)`.
#[must_use]
pub fn hydrate(text: &str, titles: &HashMap<String, String>) -> String {
    if titles.is_empty() {
        return text.to_string();
    }
    ISSUE_URL
        .replace_all(text, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let url = &caps[2];
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            match titles.get(url) {
                Some(title) if title != url && !continues(text, end) => {
                    format!("{}[{title}]({url})", &caps[1])
                }
                _ => whole.to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_hydrate_replaces_bare_url() {
        let map = titles(&[("https://github.com/o/r/issues/5", "Fix crash")]);
        assert_eq!(
            hydrate(" https://github.com/o/r/issues/5", &map),
            " [Fix crash](https://github.com/o/r/issues/5)"
        );
    }

    #[test]
    fn test_hydrate_leaves_failed_lookup_unchanged() {
        let url = "https://github.com/o/r/issues/5";
        let map = titles(&[(url, url)]);
        let text = format!("see {url} please");
        assert_eq!(hydrate(&text, &map), text);
    }

    #[test]
    fn test_hydrate_replaces_repeated_urls() {
        let map = titles(&[("https://github.com/o/r/pull/9", "Refactor")]);
        let out = hydrate(
            "a https://github.com/o/r/pull/9 and again https://github.com/o/r/pull/9",
            &map,
        );
        assert_eq!(out.matches("[Refactor](https://github.com/o/r/pull/9)").count(), 2);
    }

    #[test]
    fn test_hydrate_ignores_url_not_preceded_by_whitespace() {
        let map = titles(&[("https://github.com/o/r/issues/5", "Fix crash")]);
        let text = "(https://github.com/o/r/issues/5)";
        assert_eq!(hydrate(text, &map), text);
    }

    #[test]
    fn test_hydrate_does_not_touch_longer_number() {
        let map = titles(&[("https://github.com/o/r/issues/5", "Fix crash")]);
        let text = " https://github.com/o/r/issues/50";
        assert_eq!(hydrate(text, &map), text);
    }

    #[test]
    fn test_find_link_targets_dedupes() {
        let targets = find_link_targets([
            "x https://github.com/o/r/issues/5 y",
            "again https://github.com/o/r/issues/5\nand https://github.com/a/b/pull/7",
            "https://github.com/o/r/issues/6 at start is not preceded by whitespace",
        ]);
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().any(|t| t.owner == "a" && t.number == 7));
    }

    #[test]
    fn test_find_link_targets_skips_comment_anchors() {
        let targets = find_link_targets([" https://github.com/o/r/issues/5#issuecomment-1"]);
        assert!(targets.is_empty());
    }
}
