//! Forward index persistence
//!
//! One [`PostImages`] snapshot per content item, written wholesale on every
//! save. The reconciler reads the previous snapshot before the new one is
//! written, which is what makes the diff possible.

use crate::reference::PostImages;
use isc_meta::{keys, ContentId, EntityId, MetaStore, StoreError};

/// Reads and writes the per-content forward index entry
#[derive(Debug, Clone, Copy)]
pub struct SnapshotStore<S> {
    store: S,
}

impl<S: MetaStore> SnapshotStore<S> {
    /// Wrap a meta store
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Previously saved images of a content item
    ///
    /// Never fails: a missing entry, a value that is not a mapping, or a
    /// failed read all yield an empty mapping.
    #[must_use]
    pub fn load_previous(&self, content: ContentId) -> PostImages {
        let value = match self.store.get_meta(content.into(), keys::CONTENT_IMAGES) {
            Ok(Some(value)) => value,
            Ok(None) => return PostImages::new(),
            Err(e) => {
                tracing::warn!("Reading image snapshot of {} failed, treating as empty: {}", content, e);
                return PostImages::new();
            }
        };
        PostImages::from_value(value).unwrap_or_else(|| {
            tracing::warn!("Image snapshot of {} is malformed, treating as empty", content);
            PostImages::new()
        })
    }

    /// Overwrite the snapshot of a content item
    ///
    /// # Errors
    /// Returns error if encoding fails or the store rejects the write
    pub fn save(&self, content: ContentId, images: &PostImages) -> Result<(), StoreError> {
        let entity = EntityId::from(content);
        let value = serde_json::to_value(images)
            .map_err(|e| StoreError::serialization(entity, keys::CONTENT_IMAGES, e))?;
        self.store.set_meta(entity, keys::CONTENT_IMAGES, value)
    }

    /// Remove the snapshot of a content item; returns whether one existed
    ///
    /// # Errors
    /// Returns error if the store rejects the delete
    pub fn delete(&self, content: ContentId) -> Result<bool, StoreError> {
        self.store.delete_meta(content.into(), keys::CONTENT_IMAGES)
    }

    /// Every content item with a stored snapshot, decoded
    ///
    /// Malformed entries are listed as empty.
    ///
    /// # Errors
    /// Returns error if the store cannot be queried
    pub fn all(&self) -> Result<Vec<(ContentId, PostImages)>, StoreError> {
        Ok(self
            .store
            .entities_with_key(keys::CONTENT_IMAGES)?
            .into_iter()
            .map(ContentId::from)
            .map(|content| (content, self.load_previous(content)))
            .collect())
    }

    /// Underlying meta store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
