//! Decoder for the standard Philomena search dialect
//! (`/api/v1/json/search/images`).
//!
//! This dialect already matches the normalized [`SearchPage`] shape, so
//! decoding is a plain deserialize; unknown fields are ignored.
use crate::imageboards::image::SearchPage;

pub fn parse_page(body: &str) -> Result<SearchPage, serde_json::Error> {
    serde_json::from_str(body)
}
