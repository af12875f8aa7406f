//! Attachment attribution fields
//!
//! What an editor submits for one image, and how it is normalized before it
//! reaches the meta store.

use isc_meta::{keys, ImageId, MetaStore, MetaStoreExt, StoreError};
use serde::{Deserialize, Serialize};
use url::Url;

const ALLOWED_SCHEMES: [&str; 5] = ["http", "https", "ftp", "ftps", "mailto"];

/// Attribution submitted for one image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentFields {
    /// Free-text source
    pub source: String,
    /// Link for the source
    pub source_url: String,
    /// Image belongs to the site owner
    pub own: bool,
    /// Licence name, if chosen
    pub licence: Option<String>,
}

impl AttachmentFields {
    /// Fields with only a source text
    #[must_use]
    pub fn with_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Mark as the owner's image
    #[inline]
    #[must_use]
    pub fn own(mut self) -> Self {
        self.own = true;
        self
    }

    /// With a source link
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// With a licence
    #[must_use]
    pub fn with_licence(mut self, licence: impl Into<String>) -> Self {
        self.licence = Some(licence.into());
        self
    }

    /// Write the normalized fields to `image`
    ///
    /// Source is trimmed, the URL sanitized, and own stored as `"1"` or
    /// `""`. The licence is only written when one was chosen.
    ///
    /// # Errors
    /// Returns the first store error; earlier fields stay written
    pub fn store<S: MetaStore + ?Sized>(&self, store: &S, image: ImageId) -> Result<(), StoreError> {
        store.set_as(image, keys::IMAGE_SOURCE, &self.source.trim())?;
        store.set_as(image, keys::IMAGE_SOURCE_URL, &sanitize_url(&self.source_url))?;
        store.set_as(image, keys::IMAGE_SOURCE_OWN, &if self.own { "1" } else { "" })?;
        if let Some(licence) = &self.licence {
            store.set_as(image, keys::IMAGE_LICENCE, &licence.trim())?;
        }
        Ok(())
    }

    /// Read the fields stored on `image`; absent keys read as empty
    ///
    /// # Errors
    /// Returns error if the store cannot be read
    pub fn load<S: MetaStore + ?Sized>(store: &S, image: ImageId) -> Result<Self, StoreError> {
        let text = |key: &str| store.get_text(image, key).map(Option::unwrap_or_default);
        let licence = text(keys::IMAGE_LICENCE)?;
        Ok(Self {
            source: text(keys::IMAGE_SOURCE)?,
            source_url: text(keys::IMAGE_SOURCE_URL)?,
            own: text(keys::IMAGE_SOURCE_OWN)? == "1",
            licence: (!licence.is_empty()).then_some(licence),
        })
    }
}

/// Normalize a user-entered link
///
/// Accepts absolute URLs with a web, ftp or mailto scheme. Scheme-less input
/// such as `example.com/photo` is retried as `http://`. Anything else yields
/// an empty string.
#[must_use]
pub fn sanitize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw.chars().any(char::is_control) {
        return String::new();
    }
    let parsed = match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("http://{raw}")).ok(),
        Err(_) => None,
    };
    match parsed {
        Some(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => url.to_string(),
        Some(url) => {
            tracing::debug!("Dropping source URL with scheme {}", url.scheme());
            String::new()
        }
        None => String::new(),
    }
}
