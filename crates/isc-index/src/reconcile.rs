//! Incremental reconciliation of the forward and reverse indexes
//!
//! On every content save the freshly extracted image set is diffed against
//! the previous forward snapshot, and only the affected reverse entries are
//! touched:
//!
//! | set         | reverse index effect                      |
//! |-------------|-------------------------------------------|
//! | `added`     | content listed (entry created if missing) |
//! | `removed`   | content unlisted, empty entry kept        |
//! | `unchanged` | content re-listed if it went missing      |
//!
//! Each image is an independent read-modify-write. A failure on one image is
//! logged, recorded in the report and skipped; the rest still run.

use crate::reverse::ReverseIndex;
use crate::snapshot::SnapshotStore;
use indexmap::IndexSet;
use isc_meta::{ContentId, ImageId, MetaStore, StoreError};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Set difference between two image-id sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDiff {
    /// In `new` only
    pub added: IndexSet<ImageId>,
    /// In `old` only
    pub removed: IndexSet<ImageId>,
    /// In both
    pub unchanged: IndexSet<ImageId>,
}

impl IndexDiff {
    /// Diff `old` against `new`
    #[must_use]
    pub fn between(old: &IndexSet<ImageId>, new: &IndexSet<ImageId>) -> Self {
        Self {
            added: new.difference(old).copied().collect(),
            removed: old.difference(new).copied().collect(),
            unchanged: old.intersection(new).copied().collect(),
        }
    }

    /// Check if both sets were equal
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reverse-index step that failed for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStep {
    /// Listing a newly referenced image
    Add,
    /// Unlisting an image no longer referenced
    Remove,
    /// Re-checking an image still referenced
    Heal,
}

impl Display for ReconcileStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Heal => "heal",
        })
    }
}

/// An image whose reverse entry could not be updated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    /// The image
    pub image: ImageId,
    /// Step that failed
    pub step: ReconcileStep,
    /// Store error, rendered
    pub error: String,
}

/// What one reconciliation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// The content item reconciled
    pub content: ContentId,
    /// Images newly referenced
    pub added: Vec<ImageId>,
    /// Images no longer referenced
    pub removed: Vec<ImageId>,
    /// Images referenced before and after
    pub unchanged: Vec<ImageId>,
    /// Unchanged images whose reverse entry had lost the content item
    pub healed: Vec<ImageId>,
    /// Images whose update failed
    pub skipped: Vec<SkippedImage>,
}

impl ReconcileReport {
    fn new(content: ContentId, diff: &IndexDiff) -> Self {
        Self {
            content,
            added: diff.added.iter().copied().collect(),
            removed: diff.removed.iter().copied().collect(),
            unchanged: diff.unchanged.iter().copied().collect(),
            healed: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Check if every image was updated
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, image: ImageId, step: ReconcileStep, error: &StoreError) {
        tracing::warn!("Skipping {} of image {} for content {}: {}", step, image, self.content, error);
        self.skipped.push(SkippedImage {
            image,
            step,
            error: error.to_string(),
        });
    }
}

/// Keeps reverse entries in step with a content item's forward snapshot
///
/// Both stores are injected; the reconciler holds no state of its own.
#[derive(Debug, Clone)]
pub struct Reconciler<S> {
    snapshots: SnapshotStore<S>,
    reverse: ReverseIndex<S>,
}

impl<S: MetaStore> Reconciler<S> {
    /// Create reconciler over the two index stores
    #[inline]
    #[must_use]
    pub fn new(snapshots: SnapshotStore<S>, reverse: ReverseIndex<S>) -> Self {
        Self { snapshots, reverse }
    }

    /// Create reconciler with both stores over one meta store
    #[must_use]
    pub fn over(store: S) -> Self
    where
        S: Clone,
    {
        Self::new(SnapshotStore::new(store.clone()), ReverseIndex::new(store))
    }

    /// Forward snapshot store
    #[inline]
    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore<S> {
        &self.snapshots
    }

    /// Reverse index store
    #[inline]
    #[must_use]
    pub fn reverse(&self) -> &ReverseIndex<S> {
        &self.reverse
    }

    /// Bring reverse entries in line with `new_refs`
    ///
    /// Must run before the new forward snapshot is saved: the previous
    /// snapshot is the baseline of the diff.
    ///
    /// Afterwards `content` is listed for every image in `new_refs` and
    /// unlisted for every image dropped since the last save, except for
    /// images reported in [`ReconcileReport::skipped`].
    pub fn reconcile(&self, content: ContentId, new_refs: &IndexSet<ImageId>) -> ReconcileReport {
        let old_refs = self.snapshots.load_previous(content).ids();
        let diff = IndexDiff::between(&old_refs, new_refs);
        let mut report = ReconcileReport::new(content, &diff);

        for &image in &diff.added {
            match self.reverse.add(image, content) {
                Ok(_) => tracing::debug!("Listed content {} on image {}", content, image),
                Err(e) => report.skip(image, ReconcileStep::Add, &e),
            }
        }

        for &image in &diff.removed {
            match self.reverse.remove(image, content) {
                Ok(_) => tracing::debug!("Unlisted content {} from image {}", content, image),
                Err(e) => report.skip(image, ReconcileStep::Remove, &e),
            }
        }

        for &image in &diff.unchanged {
            match self.reverse.add(image, content) {
                Ok(true) => {
                    tracing::info!("Reverse index of image {} was missing content {}, restored", image, content);
                    report.healed.push(image);
                }
                Ok(false) => {}
                Err(e) => report.skip(image, ReconcileStep::Heal, &e),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isc_meta::MemoryMetaStore;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[u64]) -> IndexSet<ImageId> {
        raw.iter().copied().map(ImageId::new).collect()
    }

    #[test]
    fn diff_partitions_both_sets() {
        let diff = IndexDiff::between(&ids(&[1, 2, 3]), &ids(&[3, 4, 2]));
        assert_eq!(diff.added, ids(&[4]));
        assert_eq!(diff.removed, ids(&[1]));
        assert_eq!(diff.unchanged, ids(&[2, 3]));
        assert!(!diff.is_noop());
        assert!(IndexDiff::between(&ids(&[1]), &ids(&[1])).is_noop());
    }

    #[test]
    fn first_save_adds_everything() {
        let store = MemoryMetaStore::new();
        let reconciler = Reconciler::over(&store);
        let content = ContentId::new(10);

        let report = reconciler.reconcile(content, &ids(&[1, 2]));

        assert_eq!(report.added, vec![ImageId::new(1), ImageId::new(2)]);
        assert!(report.removed.is_empty());
        assert!(report.is_clean());
        assert!(reconciler.reverse().get(ImageId::new(1)).unwrap().contains(content));
        assert!(reconciler.reverse().get(ImageId::new(2)).unwrap().contains(content));
    }

    #[test]
    fn empty_new_set_without_history_is_noop() {
        let store = MemoryMetaStore::new();
        let reconciler = Reconciler::over(&store);

        let report = reconciler.reconcile(ContentId::new(1), &IndexSet::new());

        assert!(report.added.is_empty() && report.removed.is_empty());
        assert!(store.is_empty());
    }
}
