//! # Imageboard Copier
//!
//! imageboard_copier is a CLI utility to copy all images matching a search
//! query from one Philomena imageboard (booru) website to another through
//! their JSON APIs.
//!
//! Images are uploaded one at a time, in the order the source board returns
//! them, with exponential backoff around every page fetch and every upload.
//! In-site references inside descriptions are rewritten into absolute links
//! pointing back at the source board, and every copied image is tagged as an
//! import.
pub mod backoff;
pub mod imageboards;
pub mod migrator;
mod progress_bars;
pub mod rewriter;

pub use imageboards::client::{ApiClient, BoardClient, PostStatus};
pub use imageboards::error::ClientError;
pub use imageboards::image::{Image, SearchPage};
pub use imageboards::{ApiDialect, BoardConfig};

pub use migrator::{MigrationSummary, Migrator, TimingConfig};

pub use rewriter::LinkRewriter;
