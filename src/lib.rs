//! Concurrent RSS/Atom fetching with windowed article selection.
//!
//! `feedwire` fans one fetch task out per target URL, normalizes each feed
//! entry into an activity-stream article record, selects a window of
//! articles around a date or link anchor, emits the selection to a pluggable
//! session sink, and aggregates per-URL completion into a single job report.
//!
//! # Architecture
//!
//! - [`records`] - the wire records: jobs in, articles and reports out
//! - [`session`] - the [`Session`] sink trait plus an in-memory test double
//! - [`feed`] - the fetch pipeline: event source, per-URL task, selection
//! - [`platform`] - the [`FeedPlatform`] orchestrator
//! - [`config`] - TOML-tunable HTTP and fan-out settings
//! - [`cancel`] - cooperative job cancellation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feedwire::{Config, FeedPlatform};
//!
//! let session = Arc::new(MySession::connect());
//! let platform = FeedPlatform::with_config(session, &Config::default());
//! let report = platform.fetch(&job).await?;
//! for (url, outcome) in &report {
//!     println!("{url}: {outcome:?}");
//! }
//! ```

pub mod cancel;
pub mod config;
pub mod feed;
pub mod platform;
pub mod records;
pub mod session;
pub mod util;

pub use cancel::CancelToken;
pub use config::{Config, ConfigError};
pub use feed::{FetchError, FeedSource, HttpFeedSource, SelectionConfig};
pub use platform::{FeedPlatform, JobError};
pub use records::{
    Article, FeedChannel, FetchOptions, FetchOutcome, Job, JobReport, SinkRecord, Target,
    TargetOutcome,
};
pub use session::{MemorySession, Session};
