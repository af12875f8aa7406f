//! Strongly-typed entity identifiers
//!
//! The host platform keeps content items and image assets in one numeric id
//! space. [`ContentId`] and [`ImageId`] keep the two roles apart in the type
//! system, and both convert into the raw [`EntityId`] the meta store is keyed
//! by.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// Error parsing an identifier from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Not a base-10 unsigned integer
    #[error("invalid id '{input}': {source}")]
    NotANumber {
        /// The rejected input
        input: String,
        /// Underlying parse error
        #[source]
        source: ParseIntError,
    },

    /// Zero is never a valid entity id on the host platform
    #[error("id must be non-zero")]
    Zero,
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw id
            #[inline]
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Raw numeric value
            #[inline]
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: u64 = s.trim().parse().map_err(|source| IdError::NotANumber {
                    input: s.to_string(),
                    source,
                })?;
                if raw == 0 {
                    return Err(IdError::Zero);
                }
                Ok(Self(raw))
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

entity_id! {
    /// Identifier of a content item (article, page, ...)
    ContentId
}

entity_id! {
    /// Identifier of an image asset
    ImageId
}

entity_id! {
    /// Raw storage key shared by every kind of entity
    EntityId
}

impl From<ContentId> for EntityId {
    fn from(id: ContentId) -> Self {
        Self(id.0)
    }
}

impl From<ImageId> for EntityId {
    fn from(id: ImageId) -> Self {
        Self(id.0)
    }
}

impl From<EntityId> for ContentId {
    fn from(id: EntityId) -> Self {
        Self(id.0)
    }
}

impl From<EntityId> for ImageId {
    fn from(id: EntityId) -> Self {
        Self(id.0)
    }
}
