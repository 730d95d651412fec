// SPDX-License-Identifier: Apache-2.0

//! Body text rewriting from side-fetched data.
//!
//! Both passes build their lookup tables up front; [`ContentRewriter`] then
//! applies them to each body as it is rendered, producing a new string.

pub mod images;
pub mod links;

use std::collections::HashMap;

pub use images::{ImageMap, localize_images};
pub use links::{LinkTarget, fetch_titles, find_link_targets};

/// Link titles and localized images, applied to every rendered body.
#[derive(Debug, Clone, Default)]
pub struct ContentRewriter {
    titles: HashMap<String, String>,
    images: ImageMap,
}

impl ContentRewriter {
    /// Creates a rewriter from resolved link titles and the attachment map.
    #[must_use]
    pub fn new(titles: HashMap<String, String>, images: ImageMap) -> Self {
        Self { titles, images }
    }

    /// Hydrates links, then points attachments at local copies.
    #[must_use]
    pub fn rewrite(&self, text: &str) -> String {
        let hydrated = links::hydrate(text, &self.titles);
        images::substitute(&hydrated, &self.images)
    }
}
