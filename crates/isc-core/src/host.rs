//! Host platform collaborators
//!
//! Everything the content-management platform provides is reached through
//! these traits: content filters, post lookups, asset resolution. A host
//! implements all of them and gets [`Host`] for free.

use isc_index::{AssetCatalog, AssetResolver};
use isc_meta::{ContentId, EntityId, ImageId};
use serde::{Deserialize, Serialize};

/// Content of a post as handed to the save hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSnapshot {
    /// Post type, e.g. `post` or `page`
    pub post_type: String,
    /// Unrendered content
    pub content: String,
}

impl PostSnapshot {
    /// Create snapshot
    #[must_use]
    pub fn new(post_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_type: post_type.into(),
            content: content.into(),
        }
    }
}

/// Renders stored content the way visitors receive it
pub trait ContentFilter {
    /// Expand shortcodes, blocks and embeds
    fn apply_content_filters(&self, content: &str) -> String;
}

/// Read access to posts and their metadata
pub trait PostCatalog {
    /// Stored post, if it exists
    fn get_post(&self, id: ContentId) -> Option<PostSnapshot>;

    /// Featured image of a post
    fn get_thumbnail_id(&self, id: ContentId) -> Option<ImageId>;

    /// URL of an asset's file
    fn get_asset_url(&self, id: ImageId) -> Option<String>;

    /// Post type of any entity, content or asset
    fn post_type(&self, id: EntityId) -> Option<String>;

    /// Check if a post type is publicly viewable
    fn is_public_post_type(&self, post_type: &str) -> bool;

    /// Every content item, in ascending id order
    fn all_content(&self) -> Vec<ContentId>;
}

impl<T: ContentFilter + ?Sized> ContentFilter for &T {
    fn apply_content_filters(&self, content: &str) -> String {
        (**self).apply_content_filters(content)
    }
}

impl<T: PostCatalog + ?Sized> PostCatalog for &T {
    fn get_post(&self, id: ContentId) -> Option<PostSnapshot> {
        (**self).get_post(id)
    }

    fn get_thumbnail_id(&self, id: ContentId) -> Option<ImageId> {
        (**self).get_thumbnail_id(id)
    }

    fn get_asset_url(&self, id: ImageId) -> Option<String> {
        (**self).get_asset_url(id)
    }

    fn post_type(&self, id: EntityId) -> Option<String> {
        (**self).post_type(id)
    }

    fn is_public_post_type(&self, post_type: &str) -> bool {
        (**self).is_public_post_type(post_type)
    }

    fn all_content(&self) -> Vec<ContentId> {
        (**self).all_content()
    }
}

/// Everything image source tracking needs from the platform
pub trait Host: ContentFilter + PostCatalog + AssetResolver + AssetCatalog {}

impl<T: ContentFilter + PostCatalog + AssetResolver + AssetCatalog + ?Sized> Host for T {}
