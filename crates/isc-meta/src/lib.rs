//! ISC Meta
//!
//! Typed identifiers and per-entity key/value storage.
//!
//! # Overview
//!
//! - **ContentId / ImageId**: strong ids for the two sides of the relation
//! - **EntityId**: raw storage key both ids convert into
//! - **MetaStore**: narrow interface to the host's meta table
//! - **MemoryMetaStore**: in-memory implementation
//!
//! # Example
//!
//! ```rust
//! use isc_meta::{keys, ImageId, MemoryMetaStore, MetaStoreExt};
//!
//! let store = MemoryMetaStore::new();
//! store.set_as(ImageId::new(3), keys::IMAGE_SOURCE, &"Jane Doe").unwrap();
//!
//! let source = store.get_text(ImageId::new(3), keys::IMAGE_SOURCE).unwrap();
//! assert_eq!(source.as_deref(), Some("Jane Doe"));
//! ```

#![warn(missing_docs)]

mod error;
mod ids;
pub mod keys;
mod memory;
mod store;

pub use error::StoreError;
pub use ids::{ContentId, EntityId, IdError, ImageId};
pub use memory::MemoryMetaStore;
pub use store::{MetaStore, MetaStoreExt};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
