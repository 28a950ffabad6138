//! The migration pipeline: paginated search on the source board, link
//! rewriting, and backoff-wrapped uploads to the target board.
//!
//! Transient failures never escape [`Migrator::run`]: page fetches retry
//! until they succeed and an image that exhausts its retry budget is skipped,
//! so a run always ends at the first empty result page.
use std::time::Duration;

use log::{info, warn};
use tokio::time::sleep;

use crate::backoff::RetryPolicy;
use crate::imageboards::client::{BoardClient, PostStatus};
use crate::imageboards::image::{Image, SearchPage};
use crate::imageboards::BoardConfig;
use crate::progress_bars::migration_bar;
use crate::rewriter::LinkRewriter;

/// Timing knobs owned by the pipeline so tests can inject near-zero delays.
#[derive(Debug, Copy, Clone)]
pub struct TimingConfig {
    pub initial_retry_delay: Duration,
    pub max_retry_delay: Duration,
    /// Upload failures tolerated at the delay ceiling before skipping the
    /// image. Page fetches ignore this and retry forever.
    pub max_attempts_at_cap: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay: Duration::from_millis(250),
            max_retry_delay: Duration::from_secs(512),
            max_attempts_at_cap: 2,
        }
    }
}

impl TimingConfig {
    fn upload_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: self.initial_retry_delay,
            max_delay: self.max_retry_delay,
            max_attempts_at_cap: Some(self.max_attempts_at_cap),
        }
    }

    // A page fetch that fails forever blocks all progress anyway, so giving
    // up on it buys nothing. Retry indefinitely.
    fn page_policy(&self) -> RetryPolicy {
        RetryPolicy {
            initial_delay: self.initial_retry_delay,
            max_delay: self.max_retry_delay,
            max_attempts_at_cap: None,
        }
    }
}

/// Totals accumulated over one full run.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Result count the source board reported for the query. An estimate
    /// only; the live result set may drift during a long run.
    pub total: u64,
    pub uploaded: u64,
    pub duplicates: u64,
    pub failed: u64,
}

enum UploadOutcome {
    Uploaded,
    Duplicate,
    GaveUp,
}

/// Drives the whole migration for one query.
#[derive(Debug)]
pub struct Migrator<C: BoardClient> {
    client: C,
    source: BoardConfig,
    target: BoardConfig,
    query: String,
    timing: TimingConfig,
    rewriter: LinkRewriter,
    import_tag: String,
}

impl<C: BoardClient> Migrator<C> {
    pub fn new(client: C, source: BoardConfig, target: BoardConfig, query: &str) -> Self {
        let rewriter = LinkRewriter::new(&source.host);
        let import_tag = format!("{} import", source.abbreviated_host());

        Self {
            client,
            source,
            target,
            query: query.trim().to_string(),
            timing: TimingConfig::default(),
            rewriter,
            import_tag,
        }
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Runs the migration to completion, one image at a time in the order
    /// the source board returns them, until a fetched page comes back empty.
    pub async fn run(&self) -> MigrationSummary {
        let mut summary = MigrationSummary::default();

        let mut page_number: u64 = 1;
        let first_page = self.fetch_page_retrying(page_number).await;
        summary.total = first_page.total;

        if first_page.total == 0 {
            info!("Query \"{}\" has no images on {}", self.query, self.source.host);
            return summary;
        }

        info!("There are {} images in this query", first_page.total);

        let bar = migration_bar(first_page.total);
        bar.set_message(self.target.host.clone());

        let mut images = first_page.images;
        let mut current: u64 = 1;

        while !images.is_empty() {
            for mut image in images {
                self.prepare(&mut image);

                info!("Uploading image {}/{} ({})", current, summary.total, image.id);

                match self.upload_with_backoff(&image).await {
                    UploadOutcome::Uploaded => {
                        summary.uploaded += 1;
                        // Breather between uploads so the target board isn't
                        // hammered even when everything succeeds.
                        sleep(self.timing.initial_retry_delay).await;
                    }
                    UploadOutcome::Duplicate => summary.duplicates += 1,
                    UploadOutcome::GaveUp => summary.failed += 1,
                }

                current += 1;
                bar.inc(1);
            }

            page_number += 1;
            images = self.fetch_page_retrying(page_number).await.images;
        }

        bar.finish_and_clear();
        info!("Complete!");
        summary
    }

    /// Rewrites the description and appends the import tag. Runs once per
    /// image so upload retries re-send the same mutated image instead of
    /// stacking tags.
    fn prepare(&self, image: &mut Image) {
        image.description = self.rewriter.rewrite(&image.description);
        image.tags.push(self.import_tag.clone());
    }

    async fn fetch_page_retrying(&self, page: u64) -> SearchPage {
        let mut backoff = self.timing.page_policy().backoff();

        loop {
            match self.client.fetch_page(&self.source, &self.query, page).await {
                Ok(result) => return result,
                Err(err) => {
                    warn!("Error fetching page {page}: {err}");
                    let delay = backoff.on_failure();
                    info!("Retrying in {:.2?}...", delay);
                    sleep(delay).await;
                }
            }
        }
    }

    async fn upload_with_backoff(&self, image: &Image) -> UploadOutcome {
        let mut backoff = self.timing.upload_policy().backoff();

        loop {
            match self.client.upload_image(&self.target, image).await {
                Ok(PostStatus::Success) => return UploadOutcome::Uploaded,
                Ok(PostStatus::Duplicate) => {
                    info!("Image {} has already been uploaded", image.id);
                    return UploadOutcome::Duplicate;
                }
                Err(err) => {
                    warn!("Error uploading image {}: {err}", image.id);
                    let delay = backoff.on_failure();
                    info!("Retrying in {:.2?}...", delay);
                    sleep(delay).await;

                    if backoff.is_exhausted() {
                        warn!("Max attempts reached; moving onto next image.");
                        return UploadOutcome::GaveUp;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::imageboards::error::ClientError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    struct ScriptedClient {
        pages: Mutex<VecDeque<Result<SearchPage, ClientError>>>,
        uploads: Mutex<VecDeque<Result<PostStatus, ClientError>>>,
        sent: Arc<Mutex<Vec<Image>>>,
        fetched: Arc<Mutex<Vec<u64>>>,
    }

    impl ScriptedClient {
        fn new(
            pages: Vec<Result<SearchPage, ClientError>>,
            uploads: Vec<Result<PostStatus, ClientError>>,
        ) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                uploads: Mutex::new(uploads.into()),
                sent: Arc::new(Mutex::new(Vec::new())),
                fetched: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl BoardClient for ScriptedClient {
        async fn fetch_page(
            &self,
            _board: &BoardConfig,
            _query: &str,
            page: u64,
        ) -> Result<SearchPage, ClientError> {
            self.fetched.lock().unwrap().push(page);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("pipeline fetched more pages than scripted")
        }

        async fn upload_image(
            &self,
            _board: &BoardConfig,
            image: &Image,
        ) -> Result<PostStatus, ClientError> {
            self.sent.lock().unwrap().push(image.clone());
            self.uploads
                .lock()
                .unwrap()
                .pop_front()
                .expect("pipeline uploaded more images than scripted")
        }
    }

    fn image(id: u64) -> Image {
        Image {
            id,
            description: String::new(),
            source_url: None,
            tags: vec!["safe".to_string()],
            view_url: format!("https://ponybooru.org/img/view/{id}.png"),
        }
    }

    fn page(images: Vec<Image>, total: u64) -> Result<SearchPage, ClientError> {
        Ok(SearchPage { images, total })
    }

    fn request_error() -> ClientError {
        ClientError::UnexpectedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn fast_timing() -> TimingConfig {
        TimingConfig {
            initial_retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(4),
            max_attempts_at_cap: 2,
        }
    }

    // Every upload failure starts at the delay ceiling, so two failures
    // exhaust the image's retry budget.
    fn exhausting_timing() -> TimingConfig {
        TimingConfig {
            initial_retry_delay: Duration::from_millis(1),
            max_retry_delay: Duration::from_millis(1),
            max_attempts_at_cap: 2,
        }
    }

    fn migrator(client: ScriptedClient) -> Migrator<ScriptedClient> {
        Migrator::new(
            client,
            BoardConfig::new("ponybooru.org", "aaaaaaaaaaaaaaaaaaaa"),
            BoardConfig::new("derpibooru.org", "bbbbbbbbbbbbbbbbbbbb"),
            "safe",
        )
        .with_timing(fast_timing())
    }

    #[tokio::test]
    async fn empty_query_terminates_with_no_uploads() {
        let client = ScriptedClient::new(vec![page(vec![], 0)], vec![]);
        let sent = client.sent.clone();
        let fetched = client.fetched.clone();

        let summary = migrator(client).run().await;

        assert_eq!(summary, MigrationSummary::default());
        assert_eq!(*fetched.lock().unwrap(), vec![1]);
        assert!(sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_page_then_empty_uploads_exactly_that_page() {
        let client = ScriptedClient::new(
            vec![
                page(vec![image(1), image(2), image(3)], 3),
                page(vec![], 3),
            ],
            vec![
                Ok(PostStatus::Success),
                Ok(PostStatus::Success),
                Ok(PostStatus::Success),
            ],
        );
        let sent = client.sent.clone();
        let fetched = client.fetched.clone();

        let summary = migrator(client).run().await;

        assert_eq!(summary.total, 3);
        assert_eq!(summary.uploaded, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(*fetched.lock().unwrap(), vec![1, 2]);

        let ids: Vec<u64> = sent.lock().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn import_tag_is_appended_once_across_retries() {
        let client = ScriptedClient::new(
            vec![page(vec![image(7)], 1), page(vec![], 1)],
            vec![
                Err(request_error()),
                Err(request_error()),
                Ok(PostStatus::Success),
            ],
        );
        let sent = client.sent.clone();

        let summary = migrator(client).run().await;

        assert_eq!(summary.uploaded, 1);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        for attempt in sent.iter() {
            let imports = attempt
                .tags
                .iter()
                .filter(|t| *t == "ponybooru import")
                .count();
            assert_eq!(imports, 1);
            assert_eq!(attempt.tags.last().unwrap(), "ponybooru import");
        }
    }

    #[tokio::test]
    async fn exhausted_upload_skips_the_image_and_continues() {
        let client = ScriptedClient::new(
            vec![page(vec![image(1), image(2)], 2), page(vec![], 2)],
            vec![
                Err(request_error()),
                Err(request_error()),
                Ok(PostStatus::Success),
            ],
        );
        let sent = client.sent.clone();

        let summary = migrator(client).with_timing(exhausting_timing()).run().await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.uploaded, 1);

        let ids: Vec<u64> = sent.lock().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn duplicate_is_terminal_and_not_retried() {
        let client = ScriptedClient::new(
            vec![page(vec![image(4)], 1), page(vec![], 1)],
            vec![Ok(PostStatus::Duplicate)],
        );
        let sent = client.sent.clone();

        let summary = migrator(client).run().await;

        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.uploaded, 0);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_page_fetch_retries_the_same_page() {
        let client = ScriptedClient::new(
            vec![
                Err(request_error()),
                page(vec![image(9)], 1),
                page(vec![], 1),
            ],
            vec![Ok(PostStatus::Success)],
        );
        let fetched = client.fetched.clone();

        let summary = migrator(client).run().await;

        assert_eq!(summary.uploaded, 1);
        assert_eq!(*fetched.lock().unwrap(), vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn description_is_rewritten_before_upload() {
        let mut img = image(9);
        img.description = "see >>123 and \"rules\":/pages/rules".to_string();

        let client = ScriptedClient::new(
            vec![page(vec![img], 1), page(vec![], 1)],
            vec![Ok(PostStatus::Success)],
        );
        let sent = client.sent.clone();

        migrator(client).run().await;

        let sent = sent.lock().unwrap();
        assert!(sent[0]
            .description
            .contains("\">> 123\":https://ponybooru.org/images/123"));
        assert!(sent[0]
            .description
            .contains("\"rules\":https://ponybooru.org/pages/rules"));
    }
}
