//! Reverse index persistence
//!
//! Each image carries the list of content items embedding it. Every mutation
//! here is one atomic [`MetaStore::update_meta`] of one image's entry;
//! nothing spans images.

use crate::reference::ImagePosts;
use isc_meta::{keys, ContentId, EntityId, ImageId, MetaStore, StoreError};
use serde_json::Value;

/// Reads and mutates per-image reverse index entries
#[derive(Debug, Clone, Copy)]
pub struct ReverseIndex<S> {
    store: S,
}

impl<S: MetaStore> ReverseIndex<S> {
    /// Wrap a meta store
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Content items listed for an image; empty when none were ever listed
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn get(&self, image: ImageId) -> Result<ImagePosts, StoreError> {
        Ok(self.read(image)?.unwrap_or_default())
    }

    /// Check if an image has a reverse entry at all, even an empty one
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn exists(&self, image: ImageId) -> Result<bool, StoreError> {
        Ok(self.store.get_meta(image.into(), keys::IMAGE_CONTENTS)?.is_some())
    }

    /// List `content` for `image`, creating the entry if needed
    ///
    /// Returns `true` when the entry was written, `false` when `content`
    /// was already listed.
    ///
    /// # Errors
    /// Returns error if the read or the write fails
    pub fn add(&self, image: ImageId, content: ContentId) -> Result<bool, StoreError> {
        self.modify(image, |current| {
            let mut posts = current.unwrap_or_default();
            posts.insert(content).then_some(posts)
        })
    }

    /// Unlist `content` for `image`
    ///
    /// An emptied list is written back as an empty sequence; the entry
    /// itself is kept. Returns `true` when the entry was written.
    ///
    /// # Errors
    /// Returns error if the read or the write fails
    pub fn remove(&self, image: ImageId, content: ContentId) -> Result<bool, StoreError> {
        self.modify(image, |current| {
            let mut posts = current?;
            posts.remove(content).then_some(posts)
        })
    }

    /// Drop the whole entry of an image; returns whether one existed
    ///
    /// # Errors
    /// Returns error if the store rejects the delete
    pub fn delete(&self, image: ImageId) -> Result<bool, StoreError> {
        self.store.delete_meta(image.into(), keys::IMAGE_CONTENTS)
    }

    /// Every image with a reverse entry, decoded
    ///
    /// # Errors
    /// Returns error if the store cannot be queried or an entry cannot be read
    pub fn all(&self) -> Result<Vec<(ImageId, ImagePosts)>, StoreError> {
        self.store
            .entities_with_key(keys::IMAGE_CONTENTS)?
            .into_iter()
            .map(ImageId::from)
            .map(|image| Ok((image, self.get(image)?)))
            .collect()
    }

    fn read(&self, image: ImageId) -> Result<Option<ImagePosts>, StoreError> {
        Ok(self
            .store
            .get_meta(image.into(), keys::IMAGE_CONTENTS)?
            .map(|value| decode(image, &value)))
    }

    fn modify(
        &self,
        image: ImageId,
        mut change: impl FnMut(Option<ImagePosts>) -> Option<ImagePosts>,
    ) -> Result<bool, StoreError> {
        let entity = EntityId::from(image);
        let mut encode_error = None;
        let wrote = self.store.update_meta(
            entity,
            keys::IMAGE_CONTENTS,
            &mut |current: Option<&Value>| {
                let posts = change(current.map(|value| decode(image, value)))?;
                match serde_json::to_value(&posts) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        encode_error = Some(e);
                        None
                    }
                }
            },
        )?;
        match encode_error {
            Some(e) => Err(StoreError::serialization(entity, keys::IMAGE_CONTENTS, e)),
            None => Ok(wrote),
        }
    }
}

fn decode(image: ImageId, value: &Value) -> ImagePosts {
    ImagePosts::from_value(value).unwrap_or_else(|| {
        tracing::warn!("Reverse index of image {} is malformed, treating as empty", image);
        ImagePosts::new()
    })
}
