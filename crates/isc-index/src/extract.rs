//! Image reference extraction
//!
//! Scans rendered content for `<img>` elements and resolves each one to a
//! tracked asset through an [`AssetResolver`]. Callers pass content that has
//! already been through the host's content filters, so shortcodes and blocks
//! are expanded into the markup visitors actually receive.

use crate::reference::{ImageReference, PostImages};
use isc_meta::ImageId;
use once_cell::sync::Lazy;
use regex::Regex;

static IMG_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("img tag pattern"));

static SRC_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\ssrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).expect("src pattern")
});

static CLASS_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\sclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("class pattern")
});

static WP_IMAGE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bwp-image-(\d+)\b").expect("wp-image class pattern"));

static SIZE_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<stem>.+)-\d+x\d+(?P<ext>\.[A-Za-z0-9]+)(?P<rest>[?#].*)?$")
        .expect("size suffix pattern")
});

/// Resolves image URLs to the host's asset identifiers
pub trait AssetResolver {
    /// Asset whose file lives at `url`, if it is tracked
    fn resolve_asset_by_url(&self, url: &str) -> Option<ImageId>;

    /// Check if an id names a tracked asset
    fn asset_exists(&self, id: ImageId) -> bool;
}

impl<T: AssetResolver + ?Sized> AssetResolver for &T {
    fn resolve_asset_by_url(&self, url: &str) -> Option<ImageId> {
        (**self).resolve_asset_by_url(url)
    }

    fn asset_exists(&self, id: ImageId) -> bool {
        (**self).asset_exists(id)
    }
}

/// One `<img>` element found in markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImgTag {
    /// Value of the `src` attribute, entity-decoded
    pub src: String,
    /// Id carried by a `wp-image-<id>` class, if present
    pub class_id: Option<ImageId>,
}

/// Every `<img>` element with a non-empty `src`, in document order
#[must_use]
pub fn img_tags(rendered: &str) -> Vec<ImgTag> {
    IMG_TAG
        .find_iter(rendered)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let src = first_group(&SRC_ATTR, tag)?;
            let src = decode_entities(src.trim());
            if src.is_empty() {
                return None;
            }
            let class_id = first_group(&CLASS_ATTR, tag)
                .and_then(|classes| WP_IMAGE_CLASS.captures(classes))
                .and_then(|caps| caps[1].parse::<ImageId>().ok());
            Some(ImgTag { src, class_id })
        })
        .collect()
}

/// URL of the full-size file for a generated size (`a-300x200.jpg` → `a.jpg`)
#[must_use]
pub fn strip_size_suffix(url: &str) -> Option<String> {
    SIZE_SUFFIX
        .captures(url)
        .map(|caps| format!("{}{}", &caps["stem"], &caps["ext"]))
}

/// Extracts image references from rendered content
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageExtractor;

impl ImageExtractor {
    /// Create extractor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Map every resolvable image in `rendered` to its source URL
    ///
    /// The first occurrence of an asset wins. References the resolver does
    /// not know are dropped.
    pub fn extract<R: AssetResolver + ?Sized>(&self, rendered: &str, resolver: &R) -> PostImages {
        let mut images = PostImages::new();
        for tag in img_tags(rendered) {
            match resolve(&tag, resolver) {
                Some(id) => images.insert(id, ImageReference::new(tag.src)),
                None => tracing::trace!("Dropping untracked image reference: {}", tag.src),
            }
        }
        images
    }
}

fn resolve<R: AssetResolver + ?Sized>(tag: &ImgTag, resolver: &R) -> Option<ImageId> {
    if let Some(id) = tag.class_id.filter(|id| resolver.asset_exists(*id)) {
        return Some(id);
    }
    resolver.resolve_asset_by_url(&tag.src).or_else(|| {
        strip_size_suffix(&tag.src).and_then(|full| resolver.resolve_asset_by_url(&full))
    })
}

fn first_group<'t>(re: &Regex, haystack: &'t str) -> Option<&'t str> {
    let caps = re.captures(haystack)?;
    (1..caps.len()).find_map(|i| caps.get(i)).map(|m| m.as_str())
}

fn decode_entities(src: &str) -> String {
    src.replace("&amp;", "&").replace("&#038;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct Assets(HashMap<&'static str, u64>);

    impl AssetResolver for Assets {
        fn resolve_asset_by_url(&self, url: &str) -> Option<ImageId> {
            self.0.get(url).copied().map(ImageId::new)
        }

        fn asset_exists(&self, id: ImageId) -> bool {
            self.0.values().any(|raw| *raw == id.get())
        }
    }

    fn assets() -> Assets {
        Assets(HashMap::from([
            ("http://site/a.jpg", 1),
            ("http://site/b.png", 2),
        ]))
    }

    #[test]
    fn finds_quoted_and_unquoted_src() {
        let html = r#"<p><IMG SRC="http://x/1.jpg"> <img alt='x' src='http://x/2.jpg'/> <img src=http://x/3.jpg></p>"#;
        let srcs: Vec<_> = img_tags(html).into_iter().map(|t| t.src).collect();
        assert_eq!(srcs, vec!["http://x/1.jpg", "http://x/2.jpg", "http://x/3.jpg"]);
    }

    #[test]
    fn ignores_data_src_and_srcset() {
        let html = r#"<img data-src="http://x/lazy.jpg" srcset="http://x/s.jpg 2x" src="http://x/real.jpg">"#;
        let tags = img_tags(html);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].src, "http://x/real.jpg");
    }

    #[test]
    fn reads_wp_image_class() {
        let html = r#"<img class="alignleft wp-image-42 size-large" src="http://x/a.jpg">"#;
        assert_eq!(img_tags(html)[0].class_id, Some(ImageId::new(42)));
    }

    #[test]
    fn strips_generated_size() {
        assert_eq!(
            strip_size_suffix("http://site/a-300x200.jpg").as_deref(),
            Some("http://site/a.jpg")
        );
        assert_eq!(
            strip_size_suffix("http://site/a-1024x768.jpeg?ver=2").as_deref(),
            Some("http://site/a.jpeg")
        );
        assert_eq!(strip_size_suffix("http://site/a.jpg"), None);
    }

    #[test]
    fn extract_resolves_and_drops_unknown() {
        let html = r#"
            <img src="http://site/a-150x150.jpg">
            <img src="http://cdn.example/external.jpg">
            <img src="http://site/b.png">
            <img src="http://site/a.jpg">
        "#;
        let images = ImageExtractor::new().extract(html, &assets());

        assert_eq!(images.ids().into_iter().collect::<Vec<_>>(), vec![ImageId::new(1), ImageId::new(2)]);
        assert_eq!(images.get(ImageId::new(1)).unwrap().src, "http://site/a-150x150.jpg");
        assert!(!images.get(ImageId::new(1)).unwrap().thumbnail);
    }

    #[test]
    fn class_hint_requires_known_asset() {
        let html = r#"<img class="wp-image-2" src="http://other/unknown.jpg"><img class="wp-image-99" src="http://other/x.jpg">"#;
        let images = ImageExtractor::new().extract(html, &assets());
        assert_eq!(images.len(), 1);
        assert!(images.contains(ImageId::new(2)));
    }

    #[test]
    fn decodes_ampersands() {
        let html = r#"<img src="http://x/a.jpg?w=1&amp;h=2">"#;
        assert_eq!(img_tags(html)[0].src, "http://x/a.jpg?w=1&h=2");
    }
}
