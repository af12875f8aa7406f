//! Error types for meta storage

use crate::ids::EntityId;

/// Errors raised by a [`MetaStore`](crate::MetaStore) implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the operation
    #[error("meta store unavailable: {0}")]
    Unavailable(String),

    /// Value could not be encoded or decoded
    #[error("serialization failed for {entity}/{key}: {source}")]
    Serialization {
        /// Entity whose value failed
        entity: EntityId,
        /// Meta key
        key: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// Write rejected for a single entry
    #[error("write rejected for {entity}/{key}: {reason}")]
    Rejected {
        /// Entity whose write failed
        entity: EntityId,
        /// Meta key
        key: String,
        /// Backend-supplied reason
        reason: String,
    },
}

impl StoreError {
    /// Create a rejection for one entry
    pub fn rejected(entity: impl Into<EntityId>, key: &str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            entity: entity.into(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a serialization error for one entry
    pub fn serialization(
        entity: impl Into<EntityId>,
        key: &str,
        source: serde_json::Error,
    ) -> Self {
        Self::Serialization {
            entity: entity.into(),
            key: key.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ImageId;

    #[test]
    fn rejected_display_names_entry() {
        let err = StoreError::rejected(ImageId::new(5), "image_contents", "disk full");
        assert_eq!(
            err.to_string(),
            "write rejected for 5/image_contents: disk full"
        );
    }
}
