//! JSON site dumps
//!
//! A dump holds the site (posts, assets, filters) and its meta table:
//!
//! ```json
//! {
//!   "site": {"posts": {"1": {"content": "<img src=...>"}}, "attachments": {...}},
//!   "meta": {"1": {"content_images": {...}}}
//! }
//! ```

use anyhow::{Context, Result};
use isc_core::MemorySite;
use isc_meta::MemoryMetaStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Site plus meta table, as stored on disk
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SiteDump {
    /// Posts, assets and content filters
    #[serde(default)]
    pub site: MemorySite,
    /// Meta table
    #[serde(default)]
    pub meta: MemoryMetaStore,
}

impl SiteDump {
    /// Read a dump
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not a valid dump
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site dump {}", path.display()))?;
        let dump: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid site dump {}", path.display()))?;
        tracing::debug!(
            "Loaded {} posts, {} assets, {} meta entries from {}",
            dump.site.posts.len(),
            dump.site.attachments.len(),
            dump.meta.len(),
            path.display()
        );
        Ok(dump)
    }

    /// Write the dump back
    ///
    /// # Errors
    /// Returns error if encoding or the write fails
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("failed to encode site dump")?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write site dump {}", path.display()))?;
        Ok(())
    }
}
