// SPDX-License-Identifier: Apache-2.0

//! Image localization.
//!
//! Attachments uploaded to GitHub are only reachable through short-lived
//! signed URLs that appear in the rendered HTML, never in the markdown. Those
//! URLs are downloaded into the scratch directory and keyed by the UUID they
//! carry, so that `https://github.com/user-attachments/assets/<uuid>` links in
//! the markdown can be pointed at the local copy.
//!
//! External images referenced from markdown are downloaded best-effort for
//! offline reading; their links are left alone.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use futures::stream::{self, StreamExt};
use regex::{Captures, Regex};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::github::source::ThreadSource;

/// Attachment UUID to local file path.
pub type ImageMap = HashMap<String, PathBuf>;

const PRIVATE_IMAGE_HOST: &str = "private-user-images.githubusercontent.com";

static PRIVATE_IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://private-user-images\.githubusercontent\.com/[^\s"'<>)]+"#)
        .expect("private image pattern is valid")
});

static UUID_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("uuid pattern is valid")
});

static ATTACHMENT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https://github\.com/user-attachments/assets/([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})",
    )
    .expect("attachment pattern is valid")
});

static EXTERNAL_IMAGE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>()\[\]]+\.(png|jpe?g|gif|svg|webp)(\?[^\s"'<>()\[\]]*)?"#)
        .expect("external image pattern is valid")
});

/// A signed attachment URL and the UUID it carries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrivateImage {
    /// Signed download URL.
    pub url: String,
    /// Canonical lower-case UUID.
    pub id: String,
    /// File extension without the dot.
    pub extension: String,
}

fn extension_of(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then_some(ext)
}

/// Finds distinct signed attachment URLs in HTML, keeping those whose path
/// carries a valid UUID.
#[must_use]
pub fn find_private_images<'a>(html: impl IntoIterator<Item = &'a str>) -> Vec<PrivateImage> {
    let mut seen = BTreeSet::new();
    for fragment in html {
        for m in PRIVATE_IMAGE_URL.find_iter(fragment) {
            let url = m.as_str().replace("&amp;", "&");
            let path = url.split('?').next().unwrap_or(&url);
            let Some(id) = UUID_TOKEN
                .find_iter(path)
                .filter_map(|t| Uuid::parse_str(t.as_str()).ok())
                .last()
            else {
                debug!(url = %path, "Signed image URL without a UUID");
                continue;
            };
            let extension = extension_of(path).unwrap_or_else(|| "png".to_string());
            seen.insert(PrivateImage {
                id: id.to_string(),
                extension,
                url,
            });
        }
    }

    // One download per UUID even if it was signed twice.
    let mut ids = BTreeSet::new();
    seen.into_iter().filter(|img| ids.insert(img.id.clone())).collect()
}

/// Finds distinct external image URLs in markdown, skipping signed attachments.
#[must_use]
pub fn find_external_images<'a>(markdown: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut found = BTreeSet::new();
    for text in markdown {
        for m in EXTERNAL_IMAGE_URL.find_iter(text) {
            if !m.as_str().contains(PRIVATE_IMAGE_HOST) {
                found.insert(m.as_str().to_string());
            }
        }
    }
    found.into_iter().collect()
}

async fn save(source: &dyn ThreadSource, url: &str, path: &Path) -> bool {
    match source.download(url).await {
        Ok(bytes) => match tokio::fs::write(path, &bytes).await {
            Ok(()) => true,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Failed to write image");
                false
            }
        },
        Err(e) => {
            debug!(error = %e, "Image download failed");
            false
        }
    }
}

/// Downloads signed attachments found in `html` and external images found in
/// `markdown` into `dir`, at most `limit` at a time.
///
/// Returns the attachment map; external images are saved but not mapped.
/// Individual failures are skipped.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub async fn localize_images(
    source: &dyn ThreadSource,
    html: &[String],
    markdown: &[&str],
    dir: &Path,
    limit: usize,
) -> ImageMap {
    let private = find_private_images(html.iter().map(String::as_str));
    let external = find_external_images(markdown.iter().copied());
    let limit = limit.max(1);

    let private_downloads = stream::iter(private)
        .map(|img| async move {
            let path = dir.join(format!("{}.{}", img.id, img.extension));
            save(source, &img.url, &path).await.then_some((img.id, path))
        })
        .buffer_unordered(limit)
        .filter_map(|saved| async move { saved })
        .collect::<ImageMap>();

    let external_downloads = stream::iter(external.into_iter().enumerate())
        .map(|(index, url)| async move {
            let ext = extension_of(&url).unwrap_or_else(|| "img".to_string());
            let path = dir.join(format!("external-{index}.{ext}"));
            save(source, &url, &path).await
        })
        .buffer_unordered(limit)
        .filter(|ok| std::future::ready(*ok))
        .count();

    let (images, external_saved) = tokio::join!(private_downloads, external_downloads);
    info!(
        attachments = images.len(),
        external = external_saved,
        "Localized images"
    );
    images
}

/// Points attachment links at their local copies; unknown UUIDs are left as is.
#[must_use]
pub fn substitute(text: &str, images: &ImageMap) -> String {
    if images.is_empty() {
        return text.to_string();
    }
    ATTACHMENT_URL
        .replace_all(text, |caps: &Captures<'_>| {
            match images.get(&caps[1].to_ascii_lowercase()) {
                Some(path) => path.display().to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
