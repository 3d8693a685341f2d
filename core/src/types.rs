//! Book records and the wire DTOs they are decoded from.
//!
//! # Design
//! `Book` is the record handed to the host: every text field is filled in,
//! defaults included, so the renderer never sees a missing value. The wire
//! types mirror the `volumes` response shape and are private to the parser;
//! only `volumeInfo` fields the client actually uses are declared and all
//! other keys are ignored.

use serde::{Deserialize, Serialize};

/// Authors text used when a volume lists no authors.
pub const NO_AUTHORS: &str = "No author(s) available";

/// Description text used when a volume has no description.
pub const NO_DESCRIPTION: &str = "No description available for this book.";

/// Cover shown for volumes without `imageLinks`.
pub const PLACEHOLDER_COVER_URL: &str =
    "https://books.google.com/googlebooks/images/no_cover_thumb.gif";

/// One search result.
///
/// Built once by the parser and never mutated afterwards; the cover stage
/// produces a new value through `with_cover`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub authors: String,
    pub description: String,
    pub rating: f64,
    pub thumbnail_url: String,
    pub info_url: String,
    #[serde(skip)]
    pub cover: Option<CoverImage>,
}

impl Book {
    pub(crate) fn from_volume(info: VolumeInfo, placeholder_cover_url: &str) -> Self {
        let authors = match info.authors {
            Some(names) if !names.is_empty() => names.join(", "),
            _ => NO_AUTHORS.to_string(),
        };
        let thumbnail_url = match info.image_links {
            Some(links) => links.thumbnail,
            None => placeholder_cover_url.to_string(),
        };
        Self {
            title: info.title,
            authors,
            description: info
                .description
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            rating: info.average_rating.unwrap_or(0.0).max(0.0),
            thumbnail_url,
            info_url: info.info_link,
            cover: None,
        }
    }

    /// Returns the same record carrying `cover`.
    pub fn with_cover(self, cover: Option<CoverImage>) -> Self {
        Self { cover, ..self }
    }
}

/// A decoded cover: tightly packed RGBA8 pixels, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for CoverImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// One entry of the `items` array.
#[derive(Debug, Deserialize)]
pub(crate) struct VolumeItem {
    #[serde(rename = "volumeInfo")]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VolumeInfo {
    pub title: String,
    #[serde(default)]
    pub authors: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_links: Option<ImageLinks>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    pub info_link: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageLinks {
    pub thumbnail: String,
}
