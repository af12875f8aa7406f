//! In-memory site
//!
//! A [`Host`](crate::Host) backed by plain maps. The CLI loads one from a JSON
//! dump; tests build one with the builder methods.

use crate::host::{ContentFilter, PostCatalog, PostSnapshot};
use isc_index::{AssetCatalog, AssetResolver};
use isc_meta::{ContentId, EntityId, ImageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A content item of the in-memory site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitePost {
    /// Post type
    #[serde(default = "default_post_type")]
    pub post_type: String,
    /// Stored content
    #[serde(default)]
    pub content: String,
    /// Featured image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageId>,
}

/// An asset of the in-memory site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteAttachment {
    /// File URL
    pub url: String,
    /// Post type, normally `attachment`
    #[serde(default = "default_attachment_type")]
    pub post_type: String,
}

/// Posts, assets and content filters held in memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySite {
    /// Content items by id
    pub posts: BTreeMap<ContentId, SitePost>,
    /// Assets by id
    pub attachments: BTreeMap<ImageId, SiteAttachment>,
    /// Publicly viewable post types
    pub public_post_types: BTreeSet<String>,
    /// Literal replacements applied when content is rendered
    pub shortcodes: BTreeMap<String, String>,
}

fn default_post_type() -> String {
    "post".into()
}

fn default_attachment_type() -> String {
    "attachment".into()
}

impl Default for MemorySite {
    fn default() -> Self {
        Self {
            posts: BTreeMap::new(),
            attachments: BTreeMap::new(),
            public_post_types: ["post", "page", "attachment"].into_iter().map(String::from).collect(),
            shortcodes: BTreeMap::new(),
        }
    }
}

impl MemorySite {
    /// Create empty site
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a `post`-typed content item
    #[must_use]
    pub fn with_post(self, id: u64, content: impl Into<String>) -> Self {
        self.with_typed_post(id, "post", content)
    }

    /// With a content item of any post type
    #[must_use]
    pub fn with_typed_post(
        mut self,
        id: u64,
        post_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.posts.insert(
            ContentId::new(id),
            SitePost {
                post_type: post_type.into(),
                content: content.into(),
                thumbnail: None,
            },
        );
        self
    }

    /// With an asset
    #[must_use]
    pub fn with_attachment(mut self, id: u64, url: impl Into<String>) -> Self {
        self.attachments.insert(
            ImageId::new(id),
            SiteAttachment {
                url: url.into(),
                post_type: default_attachment_type(),
            },
        );
        self
    }

    /// With a shortcode expanded on render
    #[must_use]
    pub fn with_shortcode(mut self, tag: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.shortcodes.insert(tag.into(), replacement.into());
        self
    }

    /// With an extra public post type
    #[must_use]
    pub fn with_public_type(mut self, post_type: impl Into<String>) -> Self {
        self.public_post_types.insert(post_type.into());
        self
    }

    /// Set the featured image of a post; unknown posts are ignored
    pub fn set_thumbnail(&mut self, post: ContentId, image: Option<ImageId>) {
        if let Some(entry) = self.posts.get_mut(&post) {
            entry.thumbnail = image;
        }
    }

    /// Replace a post's content, creating a `post` if needed
    pub fn set_content(&mut self, post: ContentId, content: impl Into<String>) {
        let content = content.into();
        self.posts
            .entry(post)
            .and_modify(|entry| entry.content.clone_from(&content))
            .or_insert_with(|| SitePost {
                post_type: default_post_type(),
                content: content.clone(),
                thumbnail: None,
            });
    }

    /// Remove a post; returns whether it existed
    pub fn remove_post(&mut self, post: ContentId) -> bool {
        self.posts.remove(&post).is_some()
    }
}

impl ContentFilter for MemorySite {
    fn apply_content_filters(&self, content: &str) -> String {
        self.shortcodes
            .iter()
            .fold(content.to_string(), |rendered, (tag, replacement)| {
                rendered.replace(&format!("[{tag}]"), replacement)
            })
    }
}

impl PostCatalog for MemorySite {
    fn get_post(&self, id: ContentId) -> Option<PostSnapshot> {
        self.posts
            .get(&id)
            .map(|post| PostSnapshot::new(post.post_type.clone(), post.content.clone()))
    }

    fn get_thumbnail_id(&self, id: ContentId) -> Option<ImageId> {
        self.posts.get(&id).and_then(|post| post.thumbnail)
    }

    fn get_asset_url(&self, id: ImageId) -> Option<String> {
        self.attachments.get(&id).map(|asset| asset.url.clone())
    }

    fn post_type(&self, id: EntityId) -> Option<String> {
        self.attachments
            .get(&ImageId::from(id))
            .map(|asset| asset.post_type.clone())
            .or_else(|| self.posts.get(&ContentId::from(id)).map(|post| post.post_type.clone()))
    }

    fn is_public_post_type(&self, post_type: &str) -> bool {
        self.public_post_types.contains(post_type)
    }

    fn all_content(&self) -> Vec<ContentId> {
        self.posts.keys().copied().collect()
    }
}

impl AssetResolver for MemorySite {
    fn resolve_asset_by_url(&self, url: &str) -> Option<ImageId> {
        self.attachments
            .iter()
            .find(|(_, asset)| asset.url == url)
            .map(|(id, _)| *id)
    }

    fn asset_exists(&self, id: ImageId) -> bool {
        self.attachments.contains_key(&id)
    }
}

impl AssetCatalog for MemorySite {
    fn all_assets(&self) -> Vec<ImageId> {
        self.attachments.keys().copied().collect()
    }
}
