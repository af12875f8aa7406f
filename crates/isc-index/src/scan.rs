//! Attribution status of image assets
//!
//! A read-only pass over the attribution meta of each asset. Two lists
//! matter to administrators: images whose source field was initialized but
//! left empty ("missing"), and images whose fields were never initialized at
//! all ("unused", typically uploaded before tracking was enabled).

use isc_meta::{keys, ImageId, MetaStore, MetaStoreExt, StoreError};
use serde::Serialize;

/// Lists every image asset the host knows about
pub trait AssetCatalog {
    /// All asset ids, in ascending order
    fn all_assets(&self) -> Vec<ImageId>;
}

impl<T: AssetCatalog + ?Sized> AssetCatalog for &T {
    fn all_assets(&self) -> Vec<ImageId> {
        (**self).all_assets()
    }
}

/// Attribution state of one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Source field never initialized
    Unused,
    /// Source field empty and the image is not marked as own
    Missing,
    /// Marked as the site owner's image
    Own,
    /// Source text present
    Attributed,
}

/// Classifies assets by their attribution meta
#[derive(Debug, Clone, Copy)]
pub struct AssetScan<S> {
    store: S,
}

impl<S: MetaStore> AssetScan<S> {
    /// Wrap a meta store
    #[inline]
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Attribution state of one asset
    ///
    /// # Errors
    /// Returns error if the asset's meta cannot be read
    pub fn classify(&self, image: ImageId) -> Result<SourceStatus, StoreError> {
        let Some(source) = self.store.get_text(image, keys::IMAGE_SOURCE)? else {
            return Ok(SourceStatus::Unused);
        };
        let own = self.store.get_text(image, keys::IMAGE_SOURCE_OWN)?;
        if own.as_deref() == Some("1") {
            return Ok(SourceStatus::Own);
        }
        if source.trim().is_empty() {
            Ok(SourceStatus::Missing)
        } else {
            Ok(SourceStatus::Attributed)
        }
    }

    /// Assets whose source is empty and who are not marked as own
    #[must_use]
    pub fn missing_sources(&self, assets: impl IntoIterator<Item = ImageId>) -> Vec<ImageId> {
        self.filter(assets, SourceStatus::Missing)
    }

    /// Assets whose attribution fields were never initialized
    #[must_use]
    pub fn unused_assets(&self, assets: impl IntoIterator<Item = ImageId>) -> Vec<ImageId> {
        self.filter(assets, SourceStatus::Unused)
    }

    fn filter(&self, assets: impl IntoIterator<Item = ImageId>, wanted: SourceStatus) -> Vec<ImageId> {
        assets
            .into_iter()
            .filter(|image| match self.classify(*image) {
                Ok(status) => status == wanted,
                Err(e) => {
                    tracing::warn!("Skipping image {} in source scan: {}", image, e);
                    false
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isc_meta::{EntityId, MemoryMetaStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(store: &MemoryMetaStore, id: u64, key: &str, value: serde_json::Value) {
        store.set_meta(EntityId::new(id), key, value).unwrap();
    }

    fn fixture() -> MemoryMetaStore {
        let store = MemoryMetaStore::new();
        // 1: never initialized
        // 2: initialized, empty
        set(&store, 2, keys::IMAGE_SOURCE, json!(""));
        set(&store, 2, keys::IMAGE_SOURCE_OWN, json!(""));
        // 3: empty but own
        set(&store, 3, keys::IMAGE_SOURCE, json!(""));
        set(&store, 3, keys::IMAGE_SOURCE_OWN, json!("1"));
        // 4: attributed
        set(&store, 4, keys::IMAGE_SOURCE, json!("Jane Doe"));
        // 5: whitespace only, own flag never written
        set(&store, 5, keys::IMAGE_SOURCE, json!("  "));
        store
    }

    fn all() -> Vec<ImageId> {
        (1..=5).map(ImageId::new).collect()
    }

    #[test]
    fn classify_each_state() {
        let store = fixture();
        let scan = AssetScan::new(&store);
        let statuses: Vec<_> = all().into_iter().map(|i| scan.classify(i).unwrap()).collect();
        assert_eq!(
            statuses,
            vec![
                SourceStatus::Unused,
                SourceStatus::Missing,
                SourceStatus::Own,
                SourceStatus::Attributed,
                SourceStatus::Missing,
            ]
        );
    }

    #[test]
    fn missing_and_unused_are_disjoint() {
        let store = fixture();
        let scan = AssetScan::new(&store);
        assert_eq!(scan.missing_sources(all()), vec![ImageId::new(2), ImageId::new(5)]);
        assert_eq!(scan.unused_assets(all()), vec![ImageId::new(1)]);
    }
}
