//! Plugin options
//!
//! Loaded from TOML; every field is optional and falls back to its default.
//!
//! ```toml
//! warning_onesource_missing = true
//! valid_image_post_types = ["attachment"]
//! excluded_post_types = ["attachment", "revision"]
//! ```

use crate::error::{IscError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options controlling indexing and warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IscOptions {
    /// Warn administrators about images without a source
    pub warning_onesource_missing: bool,
    /// Post types an indexed image may have
    pub valid_image_post_types: Vec<String>,
    /// Post types whose saves are never indexed
    pub excluded_post_types: Vec<String>,
}

impl IscOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With the missing-source warning on or off
    #[inline]
    #[must_use]
    pub fn with_missing_warning(mut self, enabled: bool) -> Self {
        self.warning_onesource_missing = enabled;
        self
    }

    /// With the post types accepted for indexed images
    #[must_use]
    pub fn with_valid_image_post_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.valid_image_post_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// With the post types whose saves are ignored
    #[must_use]
    pub fn with_excluded_post_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.excluded_post_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Check if an image of this post type may be indexed
    #[must_use]
    pub fn is_valid_image_type(&self, post_type: &str) -> bool {
        self.valid_image_post_types.iter().any(|t| t == post_type)
    }

    /// Check if saves of this post type are ignored
    #[must_use]
    pub fn is_excluded_type(&self, post_type: &str) -> bool {
        self.excluded_post_types.iter().any(|t| t == post_type)
    }

    /// Parse options from TOML text
    ///
    /// # Errors
    /// Returns [`IscError::Config`] if the text does not parse or the
    /// options are inconsistent
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file
    ///
    /// # Errors
    /// Returns [`IscError::Io`] if the file cannot be read, or a
    /// configuration error as in [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| IscError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&text)?;
        tracing::debug!("Loaded options from {}", path.display());
        Ok(options)
    }

    /// Check the options are usable
    ///
    /// # Errors
    /// Returns [`IscError::Config`] if no image post type is accepted
    pub fn validate(&self) -> Result<()> {
        if self.valid_image_post_types.iter().all(|t| t.trim().is_empty()) {
            return Err(IscError::Config(
                "valid_image_post_types must name at least one post type".into(),
            ));
        }
        Ok(())
    }
}

impl Default for IscOptions {
    fn default() -> Self {
        Self {
            warning_onesource_missing: true,
            valid_image_post_types: vec!["attachment".into()],
            excluded_post_types: vec!["attachment".into(), "revision".into()],
        }
    }
}
