//! Per-entity key/value persistence
//!
//! [`MetaStore`] is the narrow interface to the host platform's meta table.
//! Values are JSON documents; each `(entity, key)` pair holds at most one.
//! [`MetaStore::update_meta`] is the one atomic read-modify-write of a single
//! key; nothing here groups writes across keys.

use crate::error::StoreError;
use crate::ids::EntityId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Generic per-entity meta storage
pub trait MetaStore: Send + Sync {
    /// Read one value, `None` when the key was never written
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get_meta(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite one value
    ///
    /// # Errors
    /// Returns error if the backend rejects the write
    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError>;

    /// Replace one value with what `update` computes from the current one
    ///
    /// The read and the write happen atomically with respect to other
    /// calls on the same key. `update` returning `None` leaves the value
    /// untouched. Returns whether a value was written.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read or rejects the write
    fn update_meta(
        &self,
        entity: EntityId,
        key: &str,
        update: &mut dyn FnMut(Option<&Value>) -> Option<Value>,
    ) -> Result<bool, StoreError>;

    /// Remove one value; returns whether it existed
    ///
    /// # Errors
    /// Returns error if the backend rejects the delete
    fn delete_meta(&self, entity: EntityId, key: &str) -> Result<bool, StoreError>;

    /// Every entity holding a value under `key`, in ascending id order
    ///
    /// # Errors
    /// Returns error if the backend cannot be queried
    fn entities_with_key(&self, key: &str) -> Result<Vec<EntityId>, StoreError>;
}

impl<T: MetaStore + ?Sized> MetaStore for &T {
    fn get_meta(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get_meta(entity, key)
    }

    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set_meta(entity, key, value)
    }

    fn update_meta(
        &self,
        entity: EntityId,
        key: &str,
        update: &mut dyn FnMut(Option<&Value>) -> Option<Value>,
    ) -> Result<bool, StoreError> {
        (**self).update_meta(entity, key, update)
    }

    fn delete_meta(&self, entity: EntityId, key: &str) -> Result<bool, StoreError> {
        (**self).delete_meta(entity, key)
    }

    fn entities_with_key(&self, key: &str) -> Result<Vec<EntityId>, StoreError> {
        (**self).entities_with_key(key)
    }
}

impl<T: MetaStore + ?Sized> MetaStore for Arc<T> {
    fn get_meta(&self, entity: EntityId, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get_meta(entity, key)
    }

    fn set_meta(&self, entity: EntityId, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set_meta(entity, key, value)
    }

    fn update_meta(
        &self,
        entity: EntityId,
        key: &str,
        update: &mut dyn FnMut(Option<&Value>) -> Option<Value>,
    ) -> Result<bool, StoreError> {
        (**self).update_meta(entity, key, update)
    }

    fn delete_meta(&self, entity: EntityId, key: &str) -> Result<bool, StoreError> {
        (**self).delete_meta(entity, key)
    }

    fn entities_with_key(&self, key: &str) -> Result<Vec<EntityId>, StoreError> {
        (**self).entities_with_key(key)
    }
}

/// Typed helpers layered over any [`MetaStore`]
pub trait MetaStoreExt: MetaStore {
    /// Read and decode a value
    ///
    /// # Errors
    /// Returns [`StoreError::Serialization`] if the stored value does not
    /// decode as `T`, or the backend error
    fn get_as<T: DeserializeOwned>(
        &self,
        entity: impl Into<EntityId>,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        let entity = entity.into();
        match self.get_meta(entity, key)? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::serialization(entity, key, e)),
        }
    }

    /// Encode and write a value
    ///
    /// # Errors
    /// Returns error if encoding fails or the backend rejects the write
    fn set_as<T: Serialize>(
        &self,
        entity: impl Into<EntityId>,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let entity = entity.into();
        let value =
            serde_json::to_value(value).map_err(|e| StoreError::serialization(entity, key, e))?;
        self.set_meta(entity, key, value)
    }

    /// Read a value as text, the way form fields are stored
    ///
    /// Numbers and booleans are rendered (`true` as `"1"`, `false` and
    /// `null` as `""`); arrays and objects read as empty text.
    ///
    /// # Errors
    /// Returns the backend error
    fn get_text(&self, entity: impl Into<EntityId>, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_meta(entity.into(), key)?.map(|value| match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
        }))
    }
}

impl<T: MetaStore + ?Sized> MetaStoreExt for T {}
