//! The feed fetching pipeline.
//!
//! One fetch task per target URL drives an event stream from the fetch
//! capability, buffers normalized articles, and emits a selected window of
//! them to the session sink when the stream ends.
//!
//! The module is organized into four submodules:
//!
//! - [`source`] - the fetch capability: URL to ordered feed events
//! - [`fetcher`] - one URL's fetch-parse-select task
//! - [`normalize`] - raw feed payloads to canonical records
//! - [`selection`] - option normalization and the anchor/limit selector

pub mod fetcher;
pub mod normalize;
pub mod selection;
pub mod source;

pub use fetcher::{fetch_feed, FetchError};
pub use normalize::{RawChannel, RawEntry};
pub use selection::{select_articles, Direction, OptionsError, SelectProperty, SelectionConfig};
pub use source::{FeedEvent, FeedEventStream, FeedSource, HttpFeedSource};
