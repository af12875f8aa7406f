//! ISC Core - Image Source Control
//!
//! Wires the index crates to a host platform: the content save hook, the
//! attachment attribution fields, the missing-source warning and the index
//! maintenance operations.
//!
//! # Architecture
//!
//! ```text
//! host save event
//!       │
//!       ▼
//! ImageSourceControl ──► ImageExtractor ──► Reconciler ──► SnapshotStore
//!       │                                       │
//!       ▼                                       ▼
//! AttachmentFields                         ReverseIndex
//! ```
//!
//! # Example
//!
//! ```rust
//! use isc_core::prelude::*;
//! use isc_meta::{ContentId, ImageId, MemoryMetaStore};
//!
//! let site = MemorySite::new()
//!     .with_attachment(7, "http://site/a.jpg")
//!     .with_post(1, r#"<p><img src="http://site/a.jpg"></p>"#);
//! let isc = ImageSourceControl::new(site, MemoryMetaStore::new(), IscOptions::default());
//!
//! let outcome = isc.on_content_saved(ContentId::new(1), None);
//! assert!(outcome.is_clean());
//!
//! let relations = isc.image_post_relations().unwrap();
//! assert_eq!(relations[0].0, ImageId::new(7));
//! assert!(relations[0].1.contains(ContentId::new(1)));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod control;
pub mod error;
pub mod fields;
pub mod host;
pub mod memory;

// Re-exports
pub use config::IscOptions;
pub use control::{ImageSourceControl, ReindexSummary, SaveContext, SaveOutcome, SkipReason};
pub use error::{IscError, Result};
pub use fields::{sanitize_url, AttachmentFields};
pub use host::{ContentFilter, Host, PostCatalog, PostSnapshot};
pub use memory::{MemorySite, SiteAttachment, SitePost};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for host integrations
    pub use crate::{
        AttachmentFields, Host, ImageSourceControl, IscError, IscOptions, MemorySite,
        PostSnapshot, SaveContext, SaveOutcome,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
