//! Wire records exchanged with the session sink and the caller.
//!
//! Field names follow the activity-stream shapes the platform speaks on the
//! wire (`objectType`, `datenum`, `totalArticles`, ...), so every record
//! serializes to exactly what a session transport expects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Job Input
// ============================================================================

/// A single addressable endpoint: a feed URL or the requesting actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub address: String,
}

impl Target {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

/// An anchor given either as pre-computed epoch milliseconds or as a date
/// string still to be parsed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnchorValue {
    Epoch(i64),
    Text(String),
}

/// Raw per-job selection options (`job.object` on the wire).
///
/// Everything is optional; [`SelectionConfig::normalize`] fills in defaults.
///
/// [`SelectionConfig::normalize`]: crate::feed::SelectionConfig::normalize
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FetchOptions {
    pub limit: Option<u32>,
    pub property: Option<String>,
    pub after: Option<AnchorValue>,
    pub before: Option<AnchorValue>,
    pub from: Option<String>,
    /// Link anchor for the `property == "url"` case, carried unchanged.
    pub url: Option<String>,
}

/// A fetch job: one or more target feed URLs plus shared selection options.
///
/// `target` stays an `Option` so a missing container, an empty container and
/// a first target without an address remain distinguishable structural
/// failures.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub actor: Target,
    #[serde(default)]
    pub rid: String,
    pub verb: String,
    #[serde(default)]
    pub target: Option<Vec<Target>>,
    #[serde(default)]
    pub object: FetchOptions,
}

// ============================================================================
// Channel & Article Records
// ============================================================================

/// Feed-level image as advertised by the channel metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelImage {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Channel metadata captured once per feed and attached to every article
/// from that feed. Absent fields are empty values, never options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedChannel {
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub name: String,
    pub address: String,
    pub description: String,
    pub image: ChannelImage,
    pub favicon: String,
    pub categories: Vec<String>,
    pub language: String,
    pub author: String,
}

/// Media enclosure attached to a feed entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enclosure {
    pub url: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

/// The entry payload of an article record.
///
/// `date` is the feed's own date text; `datenum` is its best-effort epoch-ms
/// parse and stays 0 when the text is unparseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedEntry {
    #[serde(rename = "objectType")]
    pub object_type: String,
    pub title: String,
    pub date: String,
    pub datenum: i64,
    pub tags: Vec<String>,
    pub text: String,
    pub html: String,
    pub brief_text: String,
    pub brief_html: String,
    pub link: String,
    pub media: Vec<Enclosure>,
    pub source: String,
}

/// One normalized article, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub actor: FeedChannel,
    pub target: Vec<Target>,
    pub status: bool,
    pub verb: String,
    pub object: FeedEntry,
}

// ============================================================================
// Sink Records
// ============================================================================

/// Error record emitted to the sink when a fetch cannot even be issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureNotice {
    pub verb: String,
    pub actor: Target,
    pub target: Vec<Target>,
    pub status: bool,
    pub message: String,
}

/// Everything the platform can hand to [`Session::send`].
///
/// [`Session::send`]: crate::session::Session::send
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SinkRecord {
    Article(Article),
    Failure(FailureNotice),
}

impl SinkRecord {
    /// The article inside, if this record is one.
    pub fn as_article(&self) -> Option<&Article> {
        match self {
            SinkRecord::Article(article) => Some(article),
            SinkRecord::Failure(_) => None,
        }
    }
}

// ============================================================================
// Job Results
// ============================================================================

/// Per-URL completion summary for a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub total_articles: usize,
    pub article_links: Vec<String>,
}

/// Outcome of one target URL: a summary on success, an error string on
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetOutcome {
    Fetched(FetchOutcome),
    Failed(String),
}

impl TargetOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, TargetOutcome::Fetched(_))
    }

    pub fn as_fetched(&self) -> Option<&FetchOutcome> {
        match self {
            TargetOutcome::Fetched(outcome) => Some(outcome),
            TargetOutcome::Failed(_) => None,
        }
    }
}

/// Aggregate result of a job, keyed by target URL. Resolved only once every
/// spawned task has completed.
pub type JobReport = HashMap<String, TargetOutcome>;

// ============================================================================
// Tests
// ============================================================================
