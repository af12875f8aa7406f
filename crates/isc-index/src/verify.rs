//! Symmetry check between the two indexes
//!
//! Reconciliation keeps the indexes in step for the content being saved, but
//! drift elsewhere (a crash mid-reconciliation, a write from outside) is only
//! repaired when that content is saved again. This pass finds it.

use crate::reverse::ReverseIndex;
use crate::snapshot::SnapshotStore;
use isc_meta::{ContentId, ImageId, MetaStore, StoreError};
use serde::Serialize;
use std::collections::BTreeSet;

/// Which side of the relation lacks an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    /// Snapshot lists the image, reverse entry lacks the content
    MissingReverse,
    /// Reverse entry lists the content, snapshot lacks the image
    MissingForward,
}

/// One pair present in only one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Drift {
    /// Content side of the pair
    pub content: ContentId,
    /// Image side of the pair
    pub image: ImageId,
    /// Which index lacks the pair
    pub kind: DriftKind,
}

/// Every `(content, image)` pair present in exactly one of the indexes
///
/// # Errors
/// Returns error if either index cannot be enumerated
pub fn find_drift<S: MetaStore>(
    snapshots: &SnapshotStore<S>,
    reverse: &ReverseIndex<S>,
) -> Result<Vec<Drift>, StoreError> {
    let forward: BTreeSet<(ContentId, ImageId)> = snapshots
        .all()?
        .into_iter()
        .flat_map(|(content, images)| {
            images
                .iter()
                .map(move |(image, _)| (content, image))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut backward = BTreeSet::new();
    for (image, posts) in reverse.all()? {
        backward.extend(posts.iter().map(|content| (content, image)));
    }

    let mut drift: Vec<Drift> = forward
        .iter()
        .filter(|pair| !backward.contains(*pair))
        .map(|&(content, image)| Drift {
            content,
            image,
            kind: DriftKind::MissingReverse,
        })
        .collect();
    drift.extend(
        backward
            .iter()
            .filter(|pair| !forward.contains(*pair))
            .map(|&(content, image)| Drift {
                content,
                image,
                kind: DriftKind::MissingForward,
            }),
    );
    drift.sort();
    Ok(drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::Reconciler;
    use isc_meta::MemoryMetaStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn reconciled_indexes_have_no_drift() {
        let store = MemoryMetaStore::new();
        let reconciler = Reconciler::over(&store);
        let content = ContentId::new(1);
        let images = [(ImageId::new(5), crate::ImageReference::new("a.jpg"))]
            .into_iter()
            .collect::<crate::PostImages>();

        reconciler.reconcile(content, &images.ids());
        reconciler.snapshots().save(content, &images).unwrap();

        assert!(find_drift(reconciler.snapshots(), reconciler.reverse()).unwrap().is_empty());
    }

    #[test]
    fn reports_both_directions() {
        let store = MemoryMetaStore::new();
        let reconciler = Reconciler::over(&store);
        let images = [(ImageId::new(5), crate::ImageReference::new("a.jpg"))]
            .into_iter()
            .collect::<crate::PostImages>();
        reconciler.snapshots().save(ContentId::new(1), &images).unwrap();
        reconciler.reverse().add(ImageId::new(6), ContentId::new(2)).unwrap();

        let drift = find_drift(reconciler.snapshots(), reconciler.reverse()).unwrap();
        assert_eq!(
            drift,
            vec![
                Drift {
                    content: ContentId::new(1),
                    image: ImageId::new(5),
                    kind: DriftKind::MissingReverse,
                },
                Drift {
                    content: ContentId::new(2),
                    image: ImageId::new(6),
                    kind: DriftKind::MissingForward,
                },
            ]
        );
    }
}
