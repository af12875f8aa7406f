//! Image Source Control facade
//!
//! Entry points the host calls: the content save hook, attachment hooks,
//! and the maintenance operations behind the admin screens.
//!
//! # Save pipeline
//!
//! ```text
//! content ─► content filters ─► extract <img> ─► thumbnail override
//!         ─► drop non-image post types ─► reconcile reverse index
//!         ─► overwrite forward snapshot
//! ```
//!
//! The forward snapshot is written last: reconciliation diffs against the
//! previous one.

use crate::config::IscOptions;
use crate::error::{IscError, Result};
use crate::fields::AttachmentFields;
use crate::host::{Host, PostSnapshot};
use isc_index::{
    find_drift, AssetScan, Drift, ImageExtractor, ImagePosts, PostImages, ReconcileReport,
    Reconciler, ReverseIndex, SnapshotStore,
};
use isc_meta::{keys, ContentId, ImageId, MetaStore, MetaStoreExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Request context of a save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveContext {
    /// Save triggered by the editor's autosave
    pub autosave: bool,
    /// Save triggered by a background request
    pub ajax: bool,
}

impl SaveContext {
    /// Context of an autosave
    #[inline]
    #[must_use]
    pub fn autosave() -> Self {
        Self {
            autosave: true,
            ajax: false,
        }
    }

    /// Context of a background request
    #[inline]
    #[must_use]
    pub fn ajax() -> Self {
        Self {
            autosave: false,
            ajax: true,
        }
    }
}

/// Why a save was not indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "post_type")]
pub enum SkipReason {
    /// Autosave
    Autosave,
    /// Background request
    Ajax,
    /// Host does not know the post type
    UnknownPostType,
    /// Post type configured as excluded
    Excluded(String),
    /// Post type not publicly viewable
    NotPublic(String),
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Autosave => f.write_str("autosave"),
            Self::Ajax => f.write_str("background request"),
            Self::UnknownPostType => f.write_str("unknown post type"),
            Self::Excluded(t) => write!(f, "excluded post type {t}"),
            Self::NotPublic(t) => write!(f, "non-public post type {t}"),
        }
    }
}

/// Result of the save hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing was touched
    Skipped(SkipReason),
    /// Indexes were updated
    Indexed {
        /// New forward snapshot
        images: PostImages,
        /// Reverse index changes
        report: ReconcileReport,
        /// Whether the forward snapshot write succeeded
        snapshot_saved: bool,
    },
}

impl SaveOutcome {
    /// Check if the save was indexed without any failed write
    #[must_use]
    pub fn is_clean(&self) -> bool {
        match self {
            Self::Skipped(_) => true,
            Self::Indexed {
                report,
                snapshot_saved,
                ..
            } => report.is_clean() && *snapshot_saved,
        }
    }
}

/// Totals of a full reindex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    /// Content items indexed
    pub indexed: usize,
    /// Content items skipped by the save filters
    pub skipped: usize,
    /// Image references recorded across all items
    pub images: usize,
    /// Reverse entries restored by self-healing
    pub healed: usize,
    /// Items with at least one failed write
    pub unclean: Vec<ContentId>,
}

impl ReindexSummary {
    /// Add one save outcome to the totals
    pub fn record(&mut self, content: ContentId, outcome: &SaveOutcome) {
        match outcome {
            SaveOutcome::Skipped(_) => self.skipped += 1,
            SaveOutcome::Indexed { images, report, .. } => {
                self.indexed += 1;
                self.images += images.len();
                self.healed += report.healed.len();
            }
        }
        if !outcome.is_clean() {
            self.unclean.push(content);
        }
    }
}

/// Keeps image attribution and the post/image indexes of one site
#[derive(Debug)]
pub struct ImageSourceControl<H, S> {
    host: H,
    store: S,
    options: IscOptions,
    extractor: ImageExtractor,
    missing_warning: Mutex<Option<usize>>,
}

impl<H: Host, S: MetaStore> ImageSourceControl<H, S> {
    /// Create over a host and its meta store
    #[must_use]
    pub fn new(host: H, store: S, options: IscOptions) -> Self {
        Self {
            host,
            store,
            options,
            extractor: ImageExtractor::new(),
            missing_warning: Mutex::new(None),
        }
    }

    /// Host collaborator
    #[inline]
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host collaborator
    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Meta store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &IscOptions {
        &self.options
    }

    /// Give back host and store
    #[must_use]
    pub fn into_parts(self) -> (H, S) {
        (self.host, self.store)
    }

    fn reconciler(&self) -> Reconciler<&S> {
        Reconciler::new(SnapshotStore::new(&self.store), ReverseIndex::new(&self.store))
    }

    /// Save hook for a regular (non-autosave, foreground) request
    pub fn on_content_saved(
        &self,
        content: ContentId,
        snapshot: Option<&PostSnapshot>,
    ) -> SaveOutcome {
        self.handle_save(SaveContext::default(), content, snapshot)
    }

    /// Save hook
    ///
    /// `snapshot` is the post as submitted; when absent or empty, the host's
    /// stored content is indexed instead. Never fails: store errors end up
    /// in the outcome and in the log.
    pub fn handle_save(
        &self,
        ctx: SaveContext,
        content: ContentId,
        snapshot: Option<&PostSnapshot>,
    ) -> SaveOutcome {
        if let Err(reason) = self.check_save(ctx, content, snapshot) {
            tracing::debug!("Not indexing content {}: {}", content, reason);
            return SaveOutcome::Skipped(reason);
        }

        let images = self.collect_images(content, snapshot);
        let reconciler = self.reconciler();
        let report = reconciler.reconcile(content, &images.ids());
        let snapshot_saved = match reconciler.snapshots().save(content, &images) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Saving image snapshot of {} failed: {}", content, e);
                false
            }
        };

        tracing::info!(
            "Indexed content {}: {} images, {} added, {} removed, {} healed, {} skipped",
            content,
            images.len(),
            report.added.len(),
            report.removed.len(),
            report.healed.len(),
            report.skipped.len()
        );

        SaveOutcome::Indexed {
            images,
            report,
            snapshot_saved,
        }
    }

    fn check_save(
        &self,
        ctx: SaveContext,
        content: ContentId,
        snapshot: Option<&PostSnapshot>,
    ) -> std::result::Result<(), SkipReason> {
        if ctx.autosave {
            return Err(SkipReason::Autosave);
        }
        if ctx.ajax {
            return Err(SkipReason::Ajax);
        }
        let post_type = snapshot
            .map(|s| s.post_type.clone())
            .filter(|t| !t.is_empty())
            .or_else(|| self.host.post_type(content.into()))
            .ok_or(SkipReason::UnknownPostType)?;
        if self.options.is_excluded_type(&post_type) {
            return Err(SkipReason::Excluded(post_type));
        }
        if !self.host.is_public_post_type(&post_type) {
            return Err(SkipReason::NotPublic(post_type));
        }
        Ok(())
    }

    /// Images a content item embeds right now, thumbnail included
    ///
    /// Images whose post type is not a valid image type are left out.
    #[must_use]
    pub fn collect_images(&self, content: ContentId, snapshot: Option<&PostSnapshot>) -> PostImages {
        let text = snapshot
            .map(|s| s.content.clone())
            .filter(|c| !c.is_empty())
            .or_else(|| self.host.get_post(content).map(|post| post.content))
            .unwrap_or_default();
        let rendered = self.host.apply_content_filters(&text);

        let mut images = self.extractor.extract(&rendered, &self.host);
        if let Some(thumbnail) = self.host.get_thumbnail_id(content) {
            let src = self.host.get_asset_url(thumbnail).unwrap_or_default();
            images.insert_thumbnail(thumbnail, src);
        }

        images.retain(|image, _| {
            let valid = self
                .host
                .post_type(image.into())
                .is_some_and(|t| self.options.is_valid_image_type(&t));
            if !valid {
                tracing::debug!("Dropping image {} of content {}: not an image post type", image, content);
            }
            valid
        });
        images
    }

    /// Deletion hook: unlist the content item everywhere, then drop its snapshot
    pub fn on_content_deleted(&self, content: ContentId) -> ReconcileReport {
        let reconciler = self.reconciler();
        let report = reconciler.reconcile(content, &indexmap::IndexSet::new());
        if let Err(e) = reconciler.snapshots().delete(content) {
            tracing::warn!("Deleting image snapshot of {} failed: {}", content, e);
        }
        tracing::info!("Removed content {} from {} reverse entries", content, report.removed.len());
        report
    }

    /// Reindex one content item the host knows about
    ///
    /// # Errors
    /// Returns [`IscError::UnknownContent`] if the host has no such item
    pub fn reindex(&self, content: ContentId) -> Result<SaveOutcome> {
        if self.host.get_post(content).is_none() {
            return Err(IscError::UnknownContent(content));
        }
        Ok(self.on_content_saved(content, None))
    }

    /// Run the save hook for every content item
    pub fn reindex_all(&self) -> ReindexSummary {
        let mut summary = ReindexSummary::default();
        for content in self.host.all_content() {
            summary.record(content, &self.on_content_saved(content, None));
        }
        tracing::info!(
            "Reindexed {} content items ({} skipped, {} with failures)",
            summary.indexed,
            summary.skipped,
            summary.unclean.len()
        );
        summary
    }

    /// Upload hook: initialize every attribution field
    ///
    /// # Errors
    /// Returns the first store error
    pub fn attachment_added(&self, image: ImageId) -> Result<()> {
        for (key, default) in keys::ATTRIBUTION_FIELDS {
            self.store.set_as(image, key, &default)?;
        }
        self.invalidate_missing_warning();
        Ok(())
    }

    /// Store attribution submitted for an image
    ///
    /// # Errors
    /// Returns the first store error
    pub fn save_attachment_fields(&self, image: ImageId, fields: &AttachmentFields) -> Result<()> {
        fields.store(&self.store, image)?;
        if self.options.warning_onesource_missing {
            self.invalidate_missing_warning();
        }
        Ok(())
    }

    /// Attribution stored for an image
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn attachment_fields(&self, image: ImageId) -> Result<AttachmentFields> {
        Ok(AttachmentFields::load(&self.store, image)?)
    }

    /// Initialize absent attribution fields on every asset
    ///
    /// Returns how many assets received at least one field.
    ///
    /// # Errors
    /// Returns the first store error
    pub fn add_meta_values_to_attachments(&self) -> Result<usize> {
        let mut touched = 0;
        for image in self.host.all_assets() {
            let mut wrote = false;
            for (key, default) in keys::ATTRIBUTION_FIELDS {
                if self.store.get_meta(image.into(), key)?.is_none() {
                    self.store.set_as(image, key, &default)?;
                    wrote = true;
                }
            }
            touched += usize::from(wrote);
        }
        if touched > 0 {
            self.invalidate_missing_warning();
        }
        tracing::info!("Initialized attribution fields on {} assets", touched);
        Ok(touched)
    }

    /// Number of images missing a source, for the admin notice
    ///
    /// `None` when the warning is disabled. The count is cached until
    /// attribution changes.
    #[must_use]
    pub fn missing_sources_warning(&self) -> Option<usize> {
        if !self.options.warning_onesource_missing {
            return None;
        }
        let mut cached = self.missing_warning.lock();
        Some(*cached.get_or_insert_with(|| self.missing_sources().len()))
    }

    fn invalidate_missing_warning(&self) {
        *self.missing_warning.lock() = None;
    }

    /// Assets with an empty source that are not marked as own
    #[must_use]
    pub fn missing_sources(&self) -> Vec<ImageId> {
        AssetScan::new(&self.store).missing_sources(self.host.all_assets())
    }

    /// Assets whose attribution was never initialized
    #[must_use]
    pub fn unused_assets(&self) -> Vec<ImageId> {
        AssetScan::new(&self.store).unused_assets(self.host.all_assets())
    }

    /// Every forward index entry
    ///
    /// # Errors
    /// Returns error if the store cannot be queried
    pub fn post_image_relations(&self) -> Result<Vec<(ContentId, PostImages)>> {
        Ok(SnapshotStore::new(&self.store).all()?)
    }

    /// Every reverse index entry
    ///
    /// # Errors
    /// Returns error if the store cannot be queried
    pub fn image_post_relations(&self) -> Result<Vec<(ImageId, ImagePosts)>> {
        Ok(ReverseIndex::new(&self.store).all()?)
    }

    /// Pairs recorded in only one of the two indexes
    ///
    /// # Errors
    /// Returns error if the store cannot be queried
    pub fn verify_index(&self) -> Result<Vec<Drift>> {
        let reconciler = self.reconciler();
        Ok(find_drift(reconciler.snapshots(), reconciler.reverse())?)
    }

    /// Delete both indexes; returns how many entries were removed
    ///
    /// # Errors
    /// Returns the first store error
    pub fn clear_index(&self) -> Result<usize> {
        let mut removed = 0;
        for key in keys::INDEX_KEYS {
            for entity in self.store.entities_with_key(key)? {
                removed += usize::from(self.store.delete_meta(entity, key)?);
            }
        }
        tracing::info!("Cleared {} index entries", removed);
        Ok(removed)
    }
}
