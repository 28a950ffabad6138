//! Normalized post model shared by both API dialects.
use serde::Deserialize;

/// One image from a board search, normalized across dialects.
///
/// The pipeline mutates it in place (description rewrite, import tag) before
/// uploading; it lives for a single pagination iteration and is never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Image {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Insertion order is display order; the import tag goes last.
    pub tags: Vec<String>,
    pub view_url: String,
}

/// One page of search results.
///
/// `total` is the full result count of the query and is only used for the
/// human-facing estimate. An empty `images` list is the pagination terminal
/// condition regardless of `total`, which may be stale during a long run.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    pub images: Vec<Image>,
    pub total: u64,
}
