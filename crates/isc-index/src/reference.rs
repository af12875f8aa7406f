//! Index value types
//!
//! [`PostImages`] is the forward index value stored on a content item;
//! [`ImagePosts`] is the reverse index value stored on an image. Both are
//! insertion-ordered, and both decode leniently from what older writers left
//! in the meta table.

use indexmap::{IndexMap, IndexSet};
use isc_meta::{ContentId, ImageId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An image embedded in a content item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReferenceRepr")]
pub struct ImageReference {
    /// Resolved source URL
    pub src: String,
    /// Set when the image is the content item's featured thumbnail
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thumbnail: bool,
}

impl ImageReference {
    /// Regular (in-content) reference
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            thumbnail: false,
        }
    }

    /// Thumbnail reference
    #[must_use]
    pub fn thumbnail(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            thumbnail: true,
        }
    }
}

// Older snapshots stored the bare URL instead of an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceRepr {
    Full {
        #[serde(default)]
        src: String,
        #[serde(default)]
        thumbnail: bool,
    },
    Url(String),
}

impl From<ReferenceRepr> for ImageReference {
    fn from(repr: ReferenceRepr) -> Self {
        match repr {
            ReferenceRepr::Full { src, thumbnail } => Self { src, thumbnail },
            ReferenceRepr::Url(src) => Self::new(src),
        }
    }
}

/// Images embedded in one content item, keyed by image id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostImages(IndexMap<ImageId, ImageReference>);

impl PostImages {
    /// Create empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored value
    ///
    /// An empty array counts as an empty mapping (how an empty associative
    /// array is encoded). Entries keyed by id `0` are dropped. Anything
    /// else that is not a mapping of ids to references yields `None`.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) if items.is_empty() => Some(Self::new()),
            Value::Object(_) => serde_json::from_value(value).ok().map(|mut images: Self| {
                images.0.retain(|id, _| id.get() != 0);
                images
            }),
            _ => None,
        }
    }

    /// Insert a regular reference, keeping the first one seen for an id
    pub fn insert(&mut self, id: ImageId, reference: ImageReference) {
        self.0.entry(id).or_insert(reference);
    }

    /// Insert the thumbnail, replacing any regular entry for the same id
    pub fn insert_thumbnail(&mut self, id: ImageId, src: impl Into<String>) {
        self.0.insert(id, ImageReference::thumbnail(src));
    }

    /// Look up one image
    #[must_use]
    pub fn get(&self, id: ImageId) -> Option<&ImageReference> {
        self.0.get(&id)
    }

    /// Check if the content embeds an image
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ImageId) -> bool {
        self.0.contains_key(&id)
    }

    /// The image ids, in insertion order
    #[must_use]
    pub fn ids(&self) -> IndexSet<ImageId> {
        self.0.keys().copied().collect()
    }

    /// The thumbnail entry, if any
    #[must_use]
    pub fn thumbnail(&self) -> Option<ImageId> {
        self.0
            .iter()
            .find(|(_, reference)| reference.thumbnail)
            .map(|(id, _)| *id)
    }

    /// Keep only the entries matching `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(ImageId, &ImageReference) -> bool) {
        self.0.retain(|id, reference| keep(*id, reference));
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ImageId, &ImageReference)> {
        self.0.iter().map(|(id, reference)| (*id, reference))
    }

    /// Number of images
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no images are embedded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ImageId, ImageReference)> for PostImages {
    fn from_iter<I: IntoIterator<Item = (ImageId, ImageReference)>>(iter: I) -> Self {
        let mut images = Self::new();
        for (id, reference) in iter {
            images.insert(id, reference);
        }
        images
    }
}

/// Content items embedding one image
///
/// Duplicate-free by construction; first-insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePosts(IndexSet<ContentId>);

impl ImagePosts {
    /// Create empty list
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored value
    ///
    /// Accepts an array, or an object whose values are the ids (a list
    /// with holes punched into it). Ids may be numbers or numeric strings;
    /// other elements are dropped. Scalars and `null` yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let items: Box<dyn Iterator<Item = &Value> + '_> = match value {
            Value::Array(items) => Box::new(items.iter()),
            Value::Object(map) => Box::new(map.values()),
            _ => return None,
        };
        Some(items.filter_map(content_id_from_value).collect())
    }

    /// Add a content item; returns `false` if it was already listed
    pub fn insert(&mut self, id: ContentId) -> bool {
        self.0.insert(id)
    }

    /// Remove a content item; returns `false` if it was not listed
    pub fn remove(&mut self, id: ContentId) -> bool {
        self.0.shift_remove(&id)
    }

    /// Check if a content item is listed
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ContentId) -> bool {
        self.0.contains(&id)
    }

    /// Iterate content items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.0.iter().copied()
    }

    /// Number of content items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no content item embeds the image
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<ContentId> for ImagePosts {
    fn from_iter<I: IntoIterator<Item = ContentId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn content_id_from_value(value: &Value) -> Option<ContentId> {
    match value {
        Value::Number(n) => n.as_u64().filter(|raw| *raw > 0).map(ContentId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
