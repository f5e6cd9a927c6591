//! The fetch capability: turning a URL into an ordered stream of feed events.
//!
//! A well-behaved stream delivers `Meta`, then each `Entry`, then `End`.
//! Transport failures are fatal to the URL's task and arrive as a
//! [`FeedEvent::Transport`]; parse failures arrive as [`FeedEvent::Parse`]
//! and leave the stream running. An error from [`FeedSource::open`] means
//! the fetch could not even be issued.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};

use crate::config::Config;
use crate::feed::fetcher::FetchError;
use crate::feed::normalize::{RawChannel, RawEntry};
use crate::records::{ChannelImage, Enclosure};
use crate::util::validate_url;

/// One event from a feed's fetch-parse stream.
#[derive(Debug)]
pub enum FeedEvent {
    /// Channel metadata; delivered once, before any entry.
    Meta(RawChannel),
    /// One feed entry.
    Entry(RawEntry),
    /// Fatal transport failure (network, HTTP status, timeout, size cap).
    Transport(FetchError),
    /// Recoverable parse failure; the stream keeps going.
    Parse(String),
    /// Stream end; nothing follows.
    End,
}

/// Boxed event stream returned by [`FeedSource::open`].
pub type FeedEventStream = Pin<Box<dyn Stream<Item = FeedEvent> + Send>>;

/// Capability that turns a URL into a stream of feed events.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Issues the fetch for `url`.
    ///
    /// # Errors
    ///
    /// Fails only when the fetch cannot be issued at all (unusable address);
    /// anything that happens after that arrives as in-stream events.
    async fn open(&self, url: &str) -> Result<FeedEventStream, FetchError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Production [`FeedSource`] backed by `reqwest` and `feed-rs`.
///
/// The body is streamed with a size cap and checked for completeness against
/// `Content-Length`; the request is wrapped in the configured timeout (none
/// when `request_timeout_secs` is 0).
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: reqwest::Client,
    timeout: Option<Duration>,
    max_feed_size: usize,
}

impl HttpFeedSource {
    /// Builds the HTTP source from platform configuration.
    pub fn new(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "HTTP client builder failed, using default client");
                reqwest::Client::new()
            });
        let timeout = (config.request_timeout_secs > 0)
            .then(|| Duration::from_secs(config.request_timeout_secs));

        Self {
            client,
            timeout,
            max_feed_size: config.max_feed_size_bytes,
        }
    }

    /// Drives one fetch to completion and returns the event sequence.
    async fn run(self, url: String) -> Vec<FeedEvent> {
        let mut events = Vec::new();

        match self.fetch_body(&url).await {
            Err(e) => events.push(FeedEvent::Transport(e)),
            Ok(bytes) => match feed_rs::parser::parse(&bytes[..]) {
                Err(e) => {
                    tracing::warn!(feed = %url, error = %e, "Feed body failed to parse");
                    events.push(FeedEvent::Parse(e.to_string()));
                }
                Ok(feed) => {
                    tracing::debug!(feed = %url, entries = feed.entries.len(), "Feed parsed");
                    events.push(FeedEvent::Meta(raw_channel(&feed)));
                    for entry in feed.entries {
                        events.push(FeedEvent::Entry(raw_entry(entry)));
                    }
                }
            },
        }

        events.push(FeedEvent::End);
        events
    }

    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request = self.client.get(url).send();
        let response = match self.timeout {
            Some(t) => tokio::time::timeout(t, request)
                .await
                .map_err(|_| FetchError::Timeout)?,
            None => request.await,
        }
        .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, self.max_feed_size).await
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn open(&self, url: &str) -> Result<FeedEventStream, FetchError> {
        let target = validate_url(url).map_err(|e| FetchError::Issue {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let source = self.clone();
        let events = async move { stream::iter(source.run(target.to_string()).await) };
        Ok(Box::pin(stream::once(events).flatten()))
    }
}

/// Reads a response body up to `limit` bytes, verifying completeness against
/// the advertised `Content-Length`.
async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // Fast path: the header already exceeds the cap
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}

// ============================================================================
// feed-rs mapping
// ============================================================================

fn raw_channel(feed: &feed_rs::model::Feed) -> RawChannel {
    RawChannel {
        title: feed
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        link: feed.links.first().map(|l| l.href.clone()).unwrap_or_default(),
        description: feed
            .description
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        image: feed.logo.as_ref().map(|img| ChannelImage {
            url: img.uri.clone(),
            width: img.width,
            height: img.height,
        }),
        favicon: feed
            .icon
            .as_ref()
            .map(|img| img.uri.clone())
            .unwrap_or_default(),
        categories: feed.categories.iter().map(category_label).collect(),
        language: feed.language.clone().unwrap_or_default(),
        author: feed
            .authors
            .first()
            .map(|p| p.name.clone())
            .unwrap_or_default(),
    }
}

fn raw_entry(entry: feed_rs::model::Entry) -> RawEntry {
    let date = entry
        .published
        .or(entry.updated)
        .map(|d| d.to_rfc2822())
        .unwrap_or_default();

    let link = entry.links.first().map(|l| l.href.clone()).unwrap_or_default();
    // Atom marks the permalink with rel="alternate"; prefer it over the
    // first link when both exist
    let orig_link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), Some("alternate") | Some("canonical")))
        .map(|l| l.href.clone());

    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| entry.summary.as_ref().map(|s| s.content.clone()))
        .unwrap_or_default();

    let enclosures = entry
        .media
        .into_iter()
        .flat_map(|m| m.content)
        .filter_map(|c| {
            let url = c.url?.to_string();
            Some(Enclosure {
                url,
                media_type: c.content_type.map(|t| t.to_string()),
                length: c.size,
            })
        })
        .collect();

    RawEntry {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        date,
        categories: entry.categories.iter().map(category_label).collect(),
        content,
        summary: entry.summary.map(|s| s.content).unwrap_or_default(),
        link,
        orig_link,
        enclosures,
        source: entry.source.unwrap_or_default(),
    }
}

fn category_label(category: &feed_rs::model::Category) -> String {
    category
        .label
        .clone()
        .unwrap_or_else(|| category.term.clone())
}

// ============================================================================
// Tests
// ============================================================================
