//! The two network operations the migration pipeline performs: fetching one
//! page of search results from the source board and uploading one image to
//! the target board.
use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::Serialize;

use super::error::ClientError;
use super::image::{Image, SearchPage};
use super::{philomena, twibooru, ApiDialect, BoardConfig, PER_PAGE, USER_AGENT};

/// Outcome of an upload attempt the server answered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Success,
    /// The target already has this image (HTTP 400 from its duplicate-hash
    /// check). Terminal for the image, not a failure of the run.
    Duplicate,
}

#[derive(Serialize)]
struct UploadImageInfo<'a> {
    description: &'a str,
    tag_input: String,
    source_url: &'a Option<String>,
}

#[derive(Serialize)]
struct UploadBody<'a> {
    image: UploadImageInfo<'a>,
    url: &'a str,
}

fn upload_body(image: &Image) -> UploadBody<'_> {
    UploadBody {
        image: UploadImageInfo {
            description: &image.description,
            tag_input: image.tags.join(", "),
            source_url: &image.source_url,
        },
        url: &image.view_url,
    }
}

/// Interface the pipeline drives. Both methods return `ClientError` for every
/// retryable condition; the backoff controller decides what happens next.
#[async_trait]
pub trait BoardClient {
    async fn fetch_page(
        &self,
        board: &BoardConfig,
        query: &str,
        page: u64,
    ) -> Result<SearchPage, ClientError>;

    async fn upload_image(
        &self,
        board: &BoardConfig,
        image: &Image,
    ) -> Result<PostStatus, ClientError>;
}

/// [`BoardClient`] backed by a shared `reqwest::Client` carrying the browser
/// user agent.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new() -> Result<Self, ClientError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BoardClient for ApiClient {
    async fn fetch_page(
        &self,
        board: &BoardConfig,
        query: &str,
        page: u64,
    ) -> Result<SearchPage, ClientError> {
        debug!("Fetching page {} from {}", page, board.host);

        // Sorting by creation time ascending keeps pagination stable while
        // new images are being created on the source board.
        let response = self
            .client
            .get(board.search_url())
            .query(&[
                ("key", board.api_key.clone()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("q", query.to_string()),
                ("sf", "created_at".to_string()),
                ("sd", "asc".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus { status });
        }

        let body = response.text().await?;

        let result = match board.dialect {
            ApiDialect::Philomena => philomena::parse_page(&body),
            ApiDialect::Twibooru => twibooru::parse_page(&body),
        }
        .map_err(|err| {
            // Both known dialects decode into a non-null image list, so dump
            // the payload when they don't.
            error!("Unexpected search response from {}: {err}. JSON: {body}", board.host);
            err
        })?;

        debug!(
            "Page {}: {} images (total {})",
            page,
            result.images.len(),
            result.total
        );
        Ok(result)
    }

    async fn upload_image(
        &self,
        board: &BoardConfig,
        image: &Image,
    ) -> Result<PostStatus, ClientError> {
        debug!("Uploading image {} to {}", image.id, board.host);

        let response = self
            .client
            .post(board.upload_url())
            .query(&[("key", board.api_key.as_str())])
            .json(&upload_body(image))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(PostStatus::Success),
            StatusCode::BAD_REQUEST => Ok(PostStatus::Duplicate),
            status => Err(ClientError::UnexpectedStatus { status }),
        }
    }
}
