//! Selection of the article window to emit: option normalization and the
//! anchor/limit selector.

use thiserror::Error;

use crate::records::{AnchorValue, Article, FetchOptions, SinkRecord};
use crate::session::Session;
use crate::util::parse_epoch_ms;

/// Number of articles emitted when a job does not say otherwise.
const DEFAULT_LIMIT: u32 = 10;

/// Malformed selection options. Surfaced as an immediate task failure,
/// before any fetch is issued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// An `after`/`before` anchor string no supported date format matches.
    #[error("invalid date string passed: {value} - {reason}")]
    InvalidDate { value: String, reason: String },
}

/// Which article field anchors and orders the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectProperty {
    #[default]
    Date,
    Link,
}

/// Whether selection proceeds to articles after or before the anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    After,
    Before,
}

/// Canonical per-task selection configuration, derived once from the job's
/// raw options and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    pub limit: u32,
    pub property: SelectProperty,
    /// Epoch-ms anchor consulted when `from` is [`Direction::After`]. 0 means unset.
    pub after: i64,
    /// Epoch-ms anchor consulted when `from` is [`Direction::Before`]. 0 means unset.
    pub before: i64,
    /// Link anchor for [`SelectProperty::Link`], carried through unchanged.
    pub url: Option<String>,
    pub from: Direction,
}

impl SelectionConfig {
    /// Normalizes raw job options into a selection configuration.
    ///
    /// Pure and deterministic: anchors already given as epoch numbers pass
    /// through unchanged, so normalizing a configuration's own values is a
    /// no-op. Date anchors are only parsed when the selection property is
    /// date-based.
    pub fn normalize(options: &FetchOptions) -> Result<Self, OptionsError> {
        let limit = options.limit.filter(|l| *l != 0).unwrap_or(DEFAULT_LIMIT);

        let property = match options.property.as_deref() {
            Some("url") => SelectProperty::Link,
            _ => SelectProperty::Date,
        };

        let (after, before) = match property {
            SelectProperty::Date => (
                resolve_anchor(options.after.as_ref())?,
                resolve_anchor(options.before.as_ref())?,
            ),
            SelectProperty::Link => (0, 0),
        };

        let from = match options.from.as_deref() {
            Some("before") => Direction::Before,
            _ => Direction::After,
        };

        Ok(Self {
            limit,
            property,
            after,
            before,
            url: options.url.clone(),
            from,
        })
    }

    /// The epoch-ms anchor the selector compares article keys against.
    fn date_anchor(&self) -> i64 {
        match self.from {
            Direction::After => self.after,
            Direction::Before => self.before,
        }
    }
}

fn resolve_anchor(value: Option<&AnchorValue>) -> Result<i64, OptionsError> {
    match value {
        None => Ok(0),
        Some(AnchorValue::Epoch(ms)) => Ok(*ms),
        Some(AnchorValue::Text(s)) => {
            parse_epoch_ms(s).ok_or_else(|| OptionsError::InvalidDate {
                value: s.clone(),
                reason: "unrecognized date format".to_string(),
            })
        }
    }
}

/// Emits the selected window of `articles` to the session.
///
/// The buffer is sorted by the selection key, ascending for `after` and
/// descending for `before`, then scanned for the anchor: an article whose
/// key exactly equals the anchor starts emission at the *following* article;
/// otherwise the first article whose key satisfies the directional
/// inequality (or any article, when the anchor is unset) starts it. Once
/// emitting, every article is sent until `limit` is reached; the rest are
/// not evaluated. The buffer itself is never mutated.
pub async fn select_articles(articles: &[Article], cfg: &SelectionConfig, session: &dyn Session) {
    if cfg.limit == 0 {
        return;
    }

    let mut sorted: Vec<&Article> = articles.iter().collect();
    match (cfg.property, cfg.from) {
        (SelectProperty::Date, Direction::After) => sorted.sort_by_key(|a| a.object.datenum),
        (SelectProperty::Date, Direction::Before) => {
            sorted.sort_by_key(|a| std::cmp::Reverse(a.object.datenum))
        }
        (SelectProperty::Link, Direction::After) => {
            sorted.sort_by(|a, b| a.object.link.cmp(&b.object.link))
        }
        (SelectProperty::Link, Direction::Before) => {
            sorted.sort_by(|a, b| b.object.link.cmp(&a.object.link))
        }
    }

    let mut emitting = false;
    let mut sent: u32 = 0;

    for article in sorted {
        if sent >= cfg.limit {
            return;
        }
        if emitting {
            session.send(SinkRecord::Article(article.clone())).await;
            sent += 1;
            continue;
        }

        if anchor_matches(article, cfg) {
            // exact anchor match: emission starts at the next article
            emitting = true;
        } else if passes_anchor(article, cfg) {
            session.send(SinkRecord::Article(article.clone())).await;
            sent += 1;
            emitting = true;
        }
    }
}

/// Exact-equality anchor test on the selection key.
fn anchor_matches(article: &Article, cfg: &SelectionConfig) -> bool {
    match cfg.property {
        SelectProperty::Date => article.object.datenum == cfg.date_anchor(),
        SelectProperty::Link => cfg
            .url
            .as_deref()
            .is_some_and(|anchor| article.object.link == anchor),
    }
}

/// Directional inequality against the anchor; an unset anchor passes
/// everything.
fn passes_anchor(article: &Article, cfg: &SelectionConfig) -> bool {
    match cfg.property {
        SelectProperty::Date => {
            let anchor = cfg.date_anchor();
            if anchor == 0 {
                return true;
            }
            match cfg.from {
                Direction::After => article.object.datenum >= anchor,
                Direction::Before => article.object.datenum <= anchor,
            }
        }
        SelectProperty::Link => match cfg.url.as_deref() {
            None => true,
            Some(anchor) => match cfg.from {
                Direction::After => article.object.link.as_str() >= anchor,
                Direction::Before => article.object.link.as_str() <= anchor,
            },
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FeedChannel, FeedEntry, Target};
    use crate::session::MemorySession;
    use pretty_assertions::assert_eq;

    fn article(datenum: i64, link: &str) -> Article {
        Article {
            actor: FeedChannel {
                object_type: "feedChannel".to_string(),
                name: "Test Feed".to_string(),
                address: "https://example.com/rss".to_string(),
                ..FeedChannel::default()
            },
            target: vec![Target::new("feeds")],
            status: true,
            verb: "post".to_string(),
            object: FeedEntry {
                object_type: "feedEntry".to_string(),
                title: format!("entry-{datenum}"),
                datenum,
                link: link.to_string(),
                ..FeedEntry::default()
            },
        }
    }

    fn dated(datenums: &[i64]) -> Vec<Article> {
        datenums
            .iter()
            .map(|d| article(*d, &format!("https://example.com/{d}")))
            .collect()
    }

    async fn run(articles: &[Article], cfg: &SelectionConfig) -> Vec<i64> {
        let session = MemorySession::new();
        select_articles(articles, cfg, &session).await;
        session
            .sent_articles()
            .iter()
            .map(|a| a.object.datenum)
            .collect()
    }

    fn config() -> SelectionConfig {
        SelectionConfig {
            limit: 10,
            property: SelectProperty::Date,
            after: 0,
            before: 0,
            url: None,
            from: Direction::After,
        }
    }

    // ------------------------------------------------------------------
    // normalize
    // ------------------------------------------------------------------

    #[test]
    fn test_normalize_defaults() {
        let cfg = SelectionConfig::normalize(&FetchOptions::default()).unwrap();
        assert_eq!(cfg.limit, 10);
        assert_eq!(cfg.property, SelectProperty::Date);
        assert_eq!(cfg.after, 0);
        assert_eq!(cfg.before, 0);
        assert_eq!(cfg.url, None);
        assert_eq!(cfg.from, Direction::After);
    }

    #[test]
    fn test_normalize_zero_limit_falls_back_to_default() {
        let options = FetchOptions {
            limit: Some(0),
            ..FetchOptions::default()
        };
        assert_eq!(SelectionConfig::normalize(&options).unwrap().limit, 10);
    }

    #[test]
    fn test_normalize_parses_date_anchors() {
        let options = FetchOptions {
            after: Some(AnchorValue::Text("2013-05-28T12:00:00Z".to_string())),
            before: Some(AnchorValue::Epoch(42)),
            ..FetchOptions::default()
        };
        let cfg = SelectionConfig::normalize(&options).unwrap();
        assert_eq!(cfg.after, 1369742400000);
        assert_eq!(cfg.before, 42);
    }

    #[test]
    fn test_normalize_bad_anchor_string_is_an_error() {
        let options = FetchOptions {
            after: Some(AnchorValue::Text("next tuesday-ish".to_string())),
            ..FetchOptions::default()
        };
        let err = SelectionConfig::normalize(&options).unwrap_err();
        assert_eq!(
            err,
            OptionsError::InvalidDate {
                value: "next tuesday-ish".to_string(),
                reason: "unrecognized date format".to_string(),
            }
        );
        assert!(err.to_string().contains("invalid date string passed"));
    }

    #[test]
    fn test_normalize_skips_anchor_parsing_for_link_property() {
        // the anchor string would fail to parse, but link selection
        // never reads date anchors
        let options = FetchOptions {
            property: Some("url".to_string()),
            after: Some(AnchorValue::Text("garbage".to_string())),
            url: Some("https://example.com/a".to_string()),
            ..FetchOptions::default()
        };
        let cfg = SelectionConfig::normalize(&options).unwrap();
        assert_eq!(cfg.property, SelectProperty::Link);
        assert_eq!(cfg.after, 0);
        assert_eq!(cfg.url.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn test_normalize_is_idempotent_on_its_own_values() {
        let options = FetchOptions {
            limit: Some(7),
            after: Some(AnchorValue::Text("2013-05-28T12:00:00Z".to_string())),
            from: Some("before".to_string()),
            ..FetchOptions::default()
        };
        let first = SelectionConfig::normalize(&options).unwrap();

        // feed the derived numeric anchors back in
        let round_trip = FetchOptions {
            limit: Some(first.limit),
            property: None,
            after: Some(AnchorValue::Epoch(first.after)),
            before: Some(AnchorValue::Epoch(first.before)),
            from: Some("before".to_string()),
            url: first.url.clone(),
        };
        let second = SelectionConfig::normalize(&round_trip).unwrap();
        assert_eq!(first, second);
    }

    // ------------------------------------------------------------------
    // select_articles
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_unset_anchor_emits_from_the_start() {
        let articles = dated(&[300, 100, 200]);
        let emitted = run(&articles, &config()).await;
        assert_eq!(emitted, vec![100, 200, 300]);
    }

    #[tokio::test]
    async fn test_limit_bounds_emission() {
        let articles = dated(&[100, 200, 300, 400]);
        let cfg = SelectionConfig {
            limit: 2,
            ..config()
        };
        assert_eq!(run(&articles, &cfg).await, vec![100, 200]);
    }

    #[tokio::test]
    async fn test_limit_zero_emits_nothing() {
        let articles = dated(&[100, 200]);
        let cfg = SelectionConfig {
            limit: 0,
            ..config()
        };
        assert!(run(&articles, &cfg).await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_buffer_emits_nothing() {
        assert!(run(&[], &config()).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_anchor_match_starts_at_next_article() {
        let articles = dated(&[100, 200, 300]);
        let cfg = SelectionConfig {
            limit: 2,
            after: 200,
            ..config()
        };
        assert_eq!(run(&articles, &cfg).await, vec![300]);
    }

    #[tokio::test]
    async fn test_inequality_anchor_emits_first_satisfying_article() {
        let articles = dated(&[100, 200, 300]);
        let cfg = SelectionConfig {
            limit: 2,
            after: 150,
            ..config()
        };
        assert_eq!(run(&articles, &cfg).await, vec![200, 300]);
    }

    #[tokio::test]
    async fn test_before_direction_descends_from_anchor() {
        let articles = dated(&[100, 200, 300, 400]);
        let cfg = SelectionConfig {
            limit: 10,
            before: 250,
            from: Direction::Before,
            ..config()
        };
        assert_eq!(run(&articles, &cfg).await, vec![200, 100]);
    }

    #[tokio::test]
    async fn test_before_exact_match_starts_at_next() {
        let articles = dated(&[100, 200, 300]);
        let cfg = SelectionConfig {
            limit: 10,
            before: 200,
            from: Direction::Before,
            ..config()
        };
        assert_eq!(run(&articles, &cfg).await, vec![100]);
    }

    #[tokio::test]
    async fn test_link_property_exact_anchor() {
        let articles = vec![
            article(0, "https://example.com/a"),
            article(0, "https://example.com/b"),
            article(0, "https://example.com/c"),
        ];
        let cfg = SelectionConfig {
            limit: 10,
            property: SelectProperty::Link,
            url: Some("https://example.com/b".to_string()),
            ..config()
        };
        let session = MemorySession::new();
        select_articles(&articles, &cfg, &session).await;
        let links: Vec<String> = session
            .sent_articles()
            .iter()
            .map(|a| a.object.link.clone())
            .collect();
        assert_eq!(links, vec!["https://example.com/c"]);
    }

    #[tokio::test]
    async fn test_link_property_without_anchor_emits_sorted() {
        let articles = vec![
            article(0, "https://example.com/c"),
            article(0, "https://example.com/a"),
        ];
        let cfg = SelectionConfig {
            limit: 10,
            property: SelectProperty::Link,
            ..config()
        };
        let session = MemorySession::new();
        select_articles(&articles, &cfg, &session).await;
        let links: Vec<String> = session
            .sent_articles()
            .iter()
            .map(|a| a.object.link.clone())
            .collect();
        assert_eq!(links, vec!["https://example.com/a", "https://example.com/c"]);
    }

    #[tokio::test]
    async fn test_unparsed_dates_match_the_unset_anchor_exactly() {
        // datenum 0 equals the unset anchor, so the first such article is
        // treated as the anchor itself and emission starts after it
        let articles = dated(&[0, 100, 200]);
        let emitted = run(&articles, &config()).await;
        assert_eq!(emitted, vec![100, 200]);
    }

    // ------------------------------------------------------------------
    // properties
    // ------------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn run_blocking(articles: &[Article], cfg: &SelectionConfig) -> Vec<i64> {
            futures::executor::block_on(async {
                let session = MemorySession::new();
                select_articles(articles, cfg, &session).await;
                session
                    .sent_articles()
                    .iter()
                    .map(|a| a.object.datenum)
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn emits_at_most_limit(
                datenums in prop::collection::vec(1i64..10_000, 0..40),
                limit in 0u32..20,
                anchor in 0i64..10_000,
                before_direction in any::<bool>(),
            ) {
                let articles = dated(&datenums);
                let cfg = SelectionConfig {
                    limit,
                    property: SelectProperty::Date,
                    after: anchor,
                    before: anchor,
                    url: None,
                    from: if before_direction { Direction::Before } else { Direction::After },
                };
                let emitted = run_blocking(&articles, &cfg);
                prop_assert!(emitted.len() <= limit as usize);
            }

            #[test]
            fn emission_is_monotonic_in_the_selection_key(
                datenums in prop::collection::vec(1i64..10_000, 0..40),
                anchor in 0i64..10_000,
                before_direction in any::<bool>(),
            ) {
                let articles = dated(&datenums);
                let from = if before_direction { Direction::Before } else { Direction::After };
                let cfg = SelectionConfig {
                    limit: 40,
                    property: SelectProperty::Date,
                    after: anchor,
                    before: anchor,
                    url: None,
                    from,
                };
                let emitted = run_blocking(&articles, &cfg);
                let ordered = match from {
                    Direction::After => emitted.windows(2).all(|w| w[0] <= w[1]),
                    Direction::Before => emitted.windows(2).all(|w| w[0] >= w[1]),
                };
                prop_assert!(ordered);
            }
        }
    }
}
