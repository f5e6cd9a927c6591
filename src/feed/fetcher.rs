//! The per-URL fetch task: stream consumption, buffering, selection.

use futures::StreamExt;
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::feed::normalize::{article_from_entry, channel_from_meta, channel_from_url};
use crate::feed::selection::{select_articles, OptionsError, SelectionConfig};
use crate::feed::source::{FeedEvent, FeedSource};
use crate::records::{FailureNotice, FetchOptions, FetchOutcome, SinkRecord, Target};
use crate::session::Session;

/// Errors that can end one URL's fetch task.
///
/// Options and issue failures happen before or while the fetch is issued;
/// the transport variants arrive as stream events; `Parse` is only surfaced
/// at stream end, after the remaining entries were consumed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Selection options were malformed; no fetch was issued.
    #[error("{0}")]
    Options(#[from] OptionsError),
    /// The fetch could not be issued for this address.
    #[error("failed to fetch feed from url: {url} : {reason}")]
    Issue { url: String, reason: String },
    /// Network-level error (DNS, connection, TLS, mid-body disconnect).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,
    /// Response body exceeded the configured size cap.
    #[error("response too large")]
    ResponseTooLarge,
    /// Response was incomplete (fewer bytes than Content-Length promised).
    #[error("incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed content could not be parsed as RSS or Atom.
    #[error("parse error: {0}")]
    Parse(String),
    /// Cancellation was requested; the task stopped at an event boundary.
    #[error("fetch cancelled")]
    Cancelled,
}

/// Fetches one feed URL end to end.
///
/// Normalizes the job options, consumes the event stream as a bounded state
/// machine, buffers every article, and emits the selected window once the
/// stream ends. The article buffer is task-local and never mutated after the
/// end event; selection is a pure read over it.
///
/// The cancellation token is polled before the fetch is issued and at every
/// event boundary. Once set, the task stops producing observable effects and
/// resolves with [`FetchError::Cancelled`]; the event stream is dropped
/// rather than explicitly closed, letting the source abandon whatever I/O it
/// still has in flight.
///
/// Parse errors are recorded and folded into the result at stream end, so a
/// feed that degrades mid-stream still has its earlier entries consumed;
/// transport errors fail the task immediately. A fetch that cannot even be
/// issued additionally reports one [`FailureNotice`] to the sink.
pub async fn fetch_feed(
    source: &dyn FeedSource,
    session: &dyn Session,
    token: &CancelToken,
    url: &str,
    options: &FetchOptions,
    job_actor: &str,
) -> Result<FetchOutcome, FetchError> {
    if token.is_cancelled() {
        return Err(FetchError::Cancelled);
    }

    let cfg = SelectionConfig::normalize(options)?;

    session.info("issuing request");
    session.debug(&format!("feed url: {url}"));

    let mut events = match source.open(url).await {
        Ok(events) => events,
        Err(e) => {
            let message = e.to_string();
            session.log(&format!("failed to fetch feed from url: {url} : {message}"));
            session
                .send(SinkRecord::Failure(FailureNotice {
                    verb: "fetch".to_string(),
                    actor: Target::new(job_actor),
                    target: vec![Target::new(url)],
                    status: false,
                    message,
                }))
                .await;
            return Err(e);
        }
    };

    let mut channel = None;
    let mut articles = Vec::new();
    let mut article_links = Vec::new();
    let mut parse_error: Option<String> = None;

    while let Some(event) = events.next().await {
        if token.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        match event {
            FeedEvent::Meta(meta) => {
                session.debug(&format!("received feed: {}", meta.title));
                channel = Some(channel_from_meta(meta, url));
            }
            FeedEvent::Entry(entry) => {
                let channel = channel.get_or_insert_with(|| channel_from_url(url));
                let article = article_from_entry(channel, job_actor, entry);
                article_links.push(article.object.link.clone());
                articles.push(article);
            }
            FeedEvent::Transport(e) => {
                session.error(&format!("failed to fetch feed from url: {url} : {e}"));
                return Err(e);
            }
            FeedEvent::Parse(message) => {
                session.error(&format!("failed to fetch feed from url: {url} : {message}"));
                parse_error = Some(message);
            }
            FeedEvent::End => break,
        }
    }

    if let Some(message) = parse_error {
        return Err(FetchError::Parse(message));
    }

    session.info("feed fetching successful. completed.");
    select_articles(&articles, &cfg, session).await;

    Ok(FetchOutcome {
        total_articles: article_links.len(),
        article_links,
    })
}

// ============================================================================
// Tests
// ============================================================================
