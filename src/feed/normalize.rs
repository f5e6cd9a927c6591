//! Builds canonical channel and article records from raw feed payloads.

use crate::records::{Article, ChannelImage, Enclosure, FeedChannel, FeedEntry, Target};
use crate::util::parse_epoch_ms;

/// Channel metadata as delivered by the parse layer, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub image: Option<ChannelImage>,
    pub favicon: String,
    pub categories: Vec<String>,
    pub language: String,
    pub author: String,
}

/// One feed entry as delivered by the parse layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: String,
    /// Date text as the feed gave it; may be empty or unparseable.
    pub date: String,
    pub categories: Vec<String>,
    /// Full entry body.
    pub content: String,
    /// Short synopsis.
    pub summary: String,
    pub link: String,
    /// Canonical/original permalink, preferred over `link` when present.
    pub orig_link: Option<String>,
    pub enclosures: Vec<Enclosure>,
    pub source: String,
}

/// Builds the per-feed channel record from stream metadata.
///
/// `name` falls back from the channel title to its link to the fetched URL;
/// absent fields become empty values.
pub(crate) fn channel_from_meta(meta: RawChannel, url: &str) -> FeedChannel {
    let RawChannel {
        title,
        link,
        description,
        image,
        favicon,
        categories,
        language,
        author,
    } = meta;

    let name = if !title.is_empty() {
        title
    } else if !link.is_empty() {
        link
    } else {
        url.to_string()
    };

    FeedChannel {
        object_type: "feedChannel".to_string(),
        name,
        address: url.to_string(),
        description,
        image: image.unwrap_or_default(),
        favicon,
        categories,
        language,
        author,
    }
}

/// Channel used when entries arrive before any metadata event.
pub(crate) fn channel_from_url(url: &str) -> FeedChannel {
    FeedChannel {
        object_type: "feedChannel".to_string(),
        name: url.to_string(),
        address: url.to_string(),
        ..FeedChannel::default()
    }
}

/// Builds one article record from a raw entry.
///
/// `datenum` is a best-effort parse of the entry's date text; an entry whose
/// date cannot be parsed keeps `datenum == 0` and is never discarded.
pub(crate) fn article_from_entry(channel: &FeedChannel, job_actor: &str, entry: RawEntry) -> Article {
    let datenum = parse_epoch_ms(&entry.date).unwrap_or(0);
    let link = entry.orig_link.unwrap_or(entry.link);

    Article {
        actor: channel.clone(),
        target: vec![Target::new(job_actor)],
        status: true,
        verb: "post".to_string(),
        object: FeedEntry {
            object_type: "feedEntry".to_string(),
            title: entry.title,
            date: entry.date,
            datenum,
            tags: entry.categories,
            text: entry.content.clone(),
            html: entry.content,
            brief_text: entry.summary.clone(),
            brief_html: entry.summary,
            link,
            media: entry.enclosures,
            source: entry.source,
        },
    }
}
