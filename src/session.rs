//! The session sink: where article records and protocol log lines go.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::records::{Article, SinkRecord};

/// Transport-facing sink the platform emits records and log lines to.
///
/// One session is shared by every concurrent fetch task of a job, so every
/// method takes `&self` and implementations must be internally synchronized.
#[async_trait]
pub trait Session: Send + Sync {
    /// Delivers one record (an article or a failure notice) to the caller.
    async fn send(&self, record: SinkRecord);

    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
    fn error(&self, msg: &str);
    fn log(&self, msg: &str);

    /// Opaque identifier of the session this platform is bound to.
    fn session_id(&self) -> String;
}

/// In-memory [`Session`] that records everything it is handed.
///
/// Meant for tests, this crate's own and downstream consumers'.
#[derive(Debug, Default)]
pub struct MemorySession {
    records: Mutex<Vec<SinkRecord>>,
    logs: Mutex<Vec<String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record sent so far, in delivery order.
    pub fn records(&self) -> Vec<SinkRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Only the article records, in delivery order.
    pub fn sent_articles(&self) -> Vec<Article> {
        self.records()
            .into_iter()
            .filter_map(|r| match r {
                SinkRecord::Article(article) => Some(article),
                SinkRecord::Failure(_) => None,
            })
            .collect()
    }

    /// Every log line, prefixed with its level.
    pub fn log_lines(&self) -> Vec<String> {
        self.logs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push_log(&self, level: &str, msg: &str) {
        self.logs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format!("{level}: {msg}"));
    }
}

#[async_trait]
impl Session for MemorySession {
    async fn send(&self, record: SinkRecord) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record);
    }

    fn info(&self, msg: &str) {
        self.push_log("info", msg);
    }

    fn debug(&self, msg: &str) {
        self.push_log("debug", msg);
    }

    fn error(&self, msg: &str) {
        self.push_log("error", msg);
    }

    fn log(&self, msg: &str) {
        self.push_log("log", msg);
    }

    fn session_id(&self) -> String {
        "memory".to_string()
    }
}
