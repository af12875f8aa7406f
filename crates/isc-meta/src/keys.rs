//! Meta keys owned by image source tracking

/// Forward index: per content item, the images it embeds
pub const CONTENT_IMAGES: &str = "content_images";

/// Reverse index: per image, the content items embedding it
pub const IMAGE_CONTENTS: &str = "image_contents";

/// Free-text attribution of an image
pub const IMAGE_SOURCE: &str = "isc_image_source";

/// Link target for the attribution text
pub const IMAGE_SOURCE_URL: &str = "isc_image_source_url";

/// `"1"` when the image belongs to the site owner and needs no attribution
pub const IMAGE_SOURCE_OWN: &str = "isc_image_source_own";

/// Licence name chosen for the image
pub const IMAGE_LICENCE: &str = "isc_image_licence";

/// Attribution fields with their default values, in display order
pub const ATTRIBUTION_FIELDS: [(&str, &str); 4] = [
    (IMAGE_SOURCE, ""),
    (IMAGE_SOURCE_OWN, ""),
    (IMAGE_SOURCE_URL, ""),
    (IMAGE_LICENCE, ""),
];

/// Keys making up the two relationship indexes
pub const INDEX_KEYS: [&str; 2] = [CONTENT_IMAGES, IMAGE_CONTENTS];
