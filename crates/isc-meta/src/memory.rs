//! In-memory [`MetaStore`]
//!
//! Backs the CLI's JSON site dumps and the test suites. `update_meta` holds
//! the write lock across its read and write.

use crate::error::StoreError;
use crate::ids::EntityId;
use crate::store::MetaStore;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

type Entries = BTreeMap<EntityId, BTreeMap<String, Value>>;

/// Thread-safe meta table held in memory
#[derive(Debug, Default)]
pub struct MemoryMetaStore {
    entries: RwLock<Entries>,
}

impl MemoryMetaStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store from existing entries
    #[must_use]
    pub fn from_entries(entries: BTreeMap<EntityId, BTreeMap<String, Value>>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Copy of every stored entry
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<EntityId, BTreeMap<String, Value>> {
        self.entries.read().clone()
    }

    /// Number of `(entity, key)` pairs stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().values().map(BTreeMap::len).sum()
    }

    /// Check if nothing is stored
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetaStore for MemoryMetaStore {
    fn get_meta(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .entries
            .read()
            .get(&entity)
            .and_then(|fields| fields.get(key))
            .cloned())
    }

    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries
            .write()
            .entry(entity)
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn update_meta(
        &self,
        entity: EntityId,
        key: &str,
        update: &mut dyn FnMut(Option<&Value>) -> Option<Value>,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let current = entries.get(&entity).and_then(|fields| fields.get(key));
        let Some(value) = update(current) else {
            return Ok(false);
        };
        entries.entry(entity).or_default().insert(key.to_string(), value);
        Ok(true)
    }

    fn delete_meta(&self, entity: EntityId, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let Some(fields) = entries.get_mut(&entity) else {
            return Ok(false);
        };
        let existed = fields.remove(key).is_some();
        if fields.is_empty() {
            entries.remove(&entity);
        }
        Ok(existed)
    }

    fn entities_with_key(&self, key: &str) -> Result<Vec<EntityId>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|(_, fields)| fields.contains_key(key))
            .map(|(entity, _)| *entity)
            .collect())
    }
}

impl Serialize for MemoryMetaStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.read().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MemoryMetaStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Entries::deserialize(deserializer).map(Self::from_entries)
    }
}
