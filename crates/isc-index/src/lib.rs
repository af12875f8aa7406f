//! ISC Index
//!
//! The two denormalized indexes behind image source tracking, and the
//! reconciliation that keeps them symmetric.
//!
//! # Overview
//!
//! - **ImageExtractor**: finds `<img>` references in rendered content
//! - **SnapshotStore**: forward index, content → images
//! - **ReverseIndex**: reverse index, image → content
//! - **Reconciler**: diffs a new image set against the previous snapshot
//!   and applies the difference to the reverse index
//! - **AssetScan**: missing/unused attribution lookups
//! - **find_drift**: pairs present in only one of the two indexes
//!
//! # Example
//!
//! ```rust
//! use isc_index::{Reconciler, SnapshotStore, ReverseIndex};
//! use isc_meta::{ContentId, ImageId, MemoryMetaStore};
//!
//! let store = MemoryMetaStore::new();
//! let reconciler = Reconciler::new(SnapshotStore::new(&store), ReverseIndex::new(&store));
//!
//! let refs = [ImageId::new(3)].into_iter().collect();
//! let report = reconciler.reconcile(ContentId::new(1), &refs);
//! assert_eq!(report.added, vec![ImageId::new(3)]);
//! ```

#![warn(missing_docs)]

pub mod extract;
pub mod reconcile;
pub mod reference;
pub mod reverse;
pub mod scan;
pub mod snapshot;
pub mod verify;

// Re-exports
pub use extract::{AssetResolver, ImageExtractor};
pub use reconcile::{IndexDiff, ReconcileReport, ReconcileStep, Reconciler, SkippedImage};
pub use reference::{ImagePosts, ImageReference, PostImages};
pub use reverse::ReverseIndex;
pub use scan::{AssetCatalog, AssetScan, SourceStatus};
pub use snapshot::SnapshotStore;
pub use verify::{find_drift, Drift, DriftKind};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for index maintenance
    pub use crate::{
        AssetResolver, ImageExtractor, ImagePosts, ImageReference, PostImages, ReconcileReport,
        Reconciler, ReverseIndex, SnapshotStore,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
