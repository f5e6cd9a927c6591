//! Job orchestration: fan-out, aggregation, cooperative cancellation.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::feed::fetcher::fetch_feed;
use crate::feed::source::{FeedSource, HttpFeedSource};
use crate::records::{Job, JobReport, TargetOutcome};
use crate::session::Session;

/// Structural job validation failures.
///
/// Everything past these checks resolves with a per-URL aggregate instead of
/// an error, mixed successes and failures included.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error("no target specified")]
    NoTarget,
    #[error("invalid target array")]
    EmptyTarget,
    #[error("no address found in first target object")]
    MissingAddress,
}

/// The feeds platform: runs one fetch task per target URL and aggregates
/// their outcomes into a single report.
pub struct FeedPlatform {
    session: Arc<dyn Session>,
    source: Arc<dyn FeedSource>,
    token: CancelToken,
    max_concurrent_fetches: usize,
}

impl FeedPlatform {
    /// Builds a platform over an arbitrary feed source.
    pub fn new(session: Arc<dyn Session>, source: Arc<dyn FeedSource>) -> Self {
        Self::bind(session, source, Config::default().max_concurrent_fetches)
    }

    /// Builds a platform fetching over HTTP, tuned by `config`.
    pub fn with_config(session: Arc<dyn Session>, config: &Config) -> Self {
        let source = Arc::new(HttpFeedSource::new(config));
        Self::bind(session, source, config.max_concurrent_fetches)
    }

    fn bind(
        session: Arc<dyn Session>,
        source: Arc<dyn FeedSource>,
        max_concurrent_fetches: usize,
    ) -> Self {
        tracing::debug!(session_id = %session.session_id(), "Feed platform bound to session");
        Self {
            session,
            source,
            token: CancelToken::new(),
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    /// The cancellation token shared by this platform's fetch tasks.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Runs a fetch job: one task per eligible target, every outcome keyed
    /// by its URL in the returned report.
    ///
    /// Structural validation fails fast, before any task is spawned. After
    /// that the report always covers every spawned task: one URL's failure
    /// never cancels its siblings, and the job resolves only once all tasks
    /// have finished. A task that observed cancellation is reported as the
    /// error string `fetch cancelled` and still counts toward completion.
    pub async fn fetch(&self, job: &Job) -> Result<JobReport, JobError> {
        let targets = job.target.as_ref().ok_or(JobError::NoTarget)?;
        let first = targets.first().ok_or(JobError::EmptyTarget)?;
        if first.address.is_empty() {
            return Err(JobError::MissingAddress);
        }

        // count before spawning; a task may finish while others still start
        let eligible: Vec<&str> = targets
            .iter()
            .filter(|t| !t.address.is_empty())
            .map(|t| t.address.as_str())
            .collect();
        if eligible.is_empty() {
            return Ok(JobReport::new());
        }

        tracing::info!(targets = eligible.len(), rid = %job.rid, "Running fetch job");

        let report: JobReport = stream::iter(eligible)
            .map(|url| {
                let session = Arc::clone(&self.session);
                let source = Arc::clone(&self.source);
                let token = self.token.clone();
                let options = &job.object;
                let job_actor = job.actor.address.as_str();

                async move {
                    let outcome = match fetch_feed(
                        source.as_ref(),
                        session.as_ref(),
                        &token,
                        url,
                        options,
                        job_actor,
                    )
                    .await
                    {
                        Ok(outcome) => TargetOutcome::Fetched(outcome),
                        Err(e) => TargetOutcome::Failed(e.to_string()),
                    };
                    (url.to_string(), outcome)
                }
            })
            .buffer_unordered(self.max_concurrent_fetches)
            .collect()
            .await;

        Ok(report)
    }

    /// Requests cooperative cancellation of every in-flight task.
    ///
    /// Write-once and idempotent. Already-completed tasks are unaffected;
    /// pending network operations are not forcibly closed, in-flight tasks
    /// stop at their next event boundary.
    pub fn cleanup(&self) {
        tracing::debug!("Cancellation requested");
        self.token.cancel();
    }
}

// ============================================================================
// Tests
// ============================================================================
