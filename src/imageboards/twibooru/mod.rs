//! Decoder for Twibooru's older search dialect (`/search.json`).
//!
//! Twibooru returns hits under `search` instead of `images`, encodes `tags`
//! as a single comma-space separated string and serves the file URL as
//! `image`. [`map_image`] folds that record into the normalized [`Image`].
use serde::Deserialize;

use crate::imageboards::image::{Image, SearchPage};

#[derive(Debug, Deserialize)]
pub struct TwibooruImage {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub tags: String,
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct TwibooruPage {
    pub search: Vec<TwibooruImage>,
    pub total: u64,
}

/// Maps a Twibooru wire record onto the normalized shape, splitting the tag
/// string on `", "` with insertion order preserved.
pub fn map_image(wire: TwibooruImage) -> Image {
    Image {
        id: wire.id,
        description: wire.description,
        source_url: wire.source_url,
        tags: wire.tags.split(", ").map(str::to_string).collect(),
        view_url: wire.image,
    }
}

pub fn parse_page(body: &str) -> Result<SearchPage, serde_json::Error> {
    let page: TwibooruPage = serde_json::from_str(body)?;

    Ok(SearchPage {
        images: page.search.into_iter().map(map_image).collect(),
        total: page.total,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tag_string_splits_in_order() {
        let wire = TwibooruImage {
            id: 77,
            description: String::new(),
            source_url: None,
            tags: "safe, solo, cute".to_string(),
            image: "https://cdn.twibooru.org/img/77.png".to_string(),
        };

        let image = map_image(wire);

        assert_eq!(image.tags, vec!["safe", "solo", "cute"]);
        assert_eq!(image.view_url, "https://cdn.twibooru.org/img/77.png");
    }

    #[test]
    fn decodes_a_search_page() {
        let body = r#"{
            "search": [
                {
                    "id": 305,
                    "description": "ported art",
                    "source_url": "https://example.com/a",
                    "tags": "safe, oc only",
                    "image": "https://cdn.twibooru.org/img/305.png",
                    "format": "png"
                }
            ],
            "total": 12
        }"#;

        let page = parse_page(body).unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.images.len(), 1);
        assert_eq!(page.images[0].id, 305);
        assert_eq!(page.images[0].tags, vec!["safe", "oc only"]);
    }

    #[test]
    fn rejects_the_philomena_shape() {
        assert!(parse_page(r#"{"images": [], "total": 0}"#).is_err());
    }
}
