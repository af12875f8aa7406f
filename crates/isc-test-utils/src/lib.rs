//! Testing utilities for the ISC workspace
//!
//! Failure injection for meta stores, markup helpers and site fixtures.

#![allow(missing_docs)]

use isc_core::{ImageSourceControl, IscOptions, MemorySite};
use isc_meta::{ContentId, EntityId, ImageId, MemoryMetaStore, MetaStore, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeSet;

/// Meta store that fails on demand for chosen entities
#[derive(Debug, Default)]
pub struct FlakyMetaStore<S = MemoryMetaStore> {
    inner: S,
    failing_writes: RwLock<BTreeSet<EntityId>>,
    failing_reads: RwLock<BTreeSet<EntityId>>,
}

impl FlakyMetaStore {
    pub fn new() -> Self {
        Self::wrap(MemoryMetaStore::new())
    }
}

impl<S: MetaStore> FlakyMetaStore<S> {
    pub fn wrap(inner: S) -> Self {
        Self {
            inner,
            failing_writes: RwLock::new(BTreeSet::new()),
            failing_reads: RwLock::new(BTreeSet::new()),
        }
    }

    /// Reject every write and delete for `entity`
    pub fn fail_writes(&self, entity: impl Into<EntityId>) {
        self.failing_writes.write().insert(entity.into());
    }

    /// Make every read of `entity` unavailable
    pub fn fail_reads(&self, entity: impl Into<EntityId>) {
        self.failing_reads.write().insert(entity.into());
    }

    /// Stop failing for `entity`
    pub fn heal(&self, entity: impl Into<EntityId>) {
        let entity = entity.into();
        self.failing_writes.write().remove(&entity);
        self.failing_reads.write().remove(&entity);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check_write(&self, entity: EntityId, key: &str) -> Result<(), StoreError> {
        if self.failing_writes.read().contains(&entity) {
            return Err(StoreError::rejected(entity, key, "injected failure"));
        }
        Ok(())
    }

    fn check_read(&self, entity: EntityId) -> Result<(), StoreError> {
        if self.failing_reads.read().contains(&entity) {
            return Err(StoreError::Unavailable(format!("injected read failure on {entity}")));
        }
        Ok(())
    }
}

impl<S: MetaStore> MetaStore for FlakyMetaStore<S> {
    fn get_meta(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError> {
        self.check_read(entity)?;
        self.inner.get_meta(entity, key)
    }

    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError> {
        self.check_write(entity, key)?;
        self.inner.set_meta(entity, key, value)
    }

    fn update_meta(
        &self,
        entity: EntityId,
        key: &str,
        update: &mut dyn FnMut(Option<&Value>) -> Option<Value>,
    ) -> Result<bool, StoreError> {
        self.check_read(entity)?;
        if let Err(e) = self.check_write(entity, key) {
            let current = self.inner.get_meta(entity, key)?;
            return match update(current.as_ref()) {
                Some(_) => Err(e),
                None => Ok(false),
            };
        }
        self.inner.update_meta(entity, key, update)
    }

    fn delete_meta(&self, entity: EntityId, key: &str) -> Result<bool, StoreError> {
        self.check_write(entity, key)?;
        self.inner.delete_meta(entity, key)
    }

    fn entities_with_key(&self, key: &str) -> Result<Vec<EntityId>, StoreError> {
        self.inner.entities_with_key(key)
    }
}

/// URL of the fixture asset `id`
pub fn asset_url(id: u64) -> String {
    format!("http://site.test/uploads/img-{id}.jpg")
}

/// `<img>` tag pointing at the fixture asset `id`
pub fn img_tag(id: u64) -> String {
    format!(r#"<img src="{}" alt="">"#, asset_url(id))
}

/// `<img>` tag carrying a `wp-image-<id>` class and an unrelated URL
pub fn img_tag_with_class(id: u64) -> String {
    format!(r#"<img class="aligncenter wp-image-{id}" src="http://cdn.test/{id}.jpg">"#)
}

/// Post body embedding the given fixture assets
pub fn content_with(images: &[u64]) -> String {
    images
        .iter()
        .map(|id| format!("<p>{}</p>", img_tag(*id)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Site with assets `ids`, each at [`asset_url`]
pub fn site_with_assets(ids: impl IntoIterator<Item = u64>) -> MemorySite {
    ids.into_iter()
        .fold(MemorySite::new(), |site, id| site.with_attachment(id, asset_url(id)))
}

/// Control over `site` with an empty store and default options
pub fn setup_control(site: MemorySite) -> ImageSourceControl<MemorySite, MemoryMetaStore> {
    ImageSourceControl::new(site, MemoryMetaStore::new(), IscOptions::default())
}

/// Control over `site` and a failure-injecting store
pub fn setup_flaky_control(site: MemorySite) -> ImageSourceControl<MemorySite, FlakyMetaStore> {
    ImageSourceControl::new(site, FlakyMetaStore::new(), IscOptions::default())
}

pub fn post(id: u64) -> ContentId {
    ContentId::new(id)
}

pub fn img(id: u64) -> ImageId {
    ImageId::new(id)
}
