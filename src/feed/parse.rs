// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, Utc};
use url::Url;

/// A single downloadable episode extracted from a feed item.
///
/// `title` is the only field callers are expected to overwrite after
/// construction (normalization, tests); everything else is fixed at parse
/// time.
#[derive(Debug, Clone)]
pub struct Episode {
    /// Enclosure location
    pub url: Url,
    /// Human-readable label; may contain characters invalid in filenames
    pub title: String,
    /// Publish time; items without a usable date get the parse-time clock
    pub published_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(url: Url, title: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            url,
            title: title.into(),
            published_at,
        }
    }
}

/// Extract the ordered episode list from a parsed channel.
///
/// Items are emitted in document order, which RSS convention puts newest
/// first; "keep the first N" therefore means "keep the N most recent" for
/// conventional feeds. Items without an enclosure, or whose enclosure URL
/// does not parse, are skipped.
pub fn extract_episodes(channel: &rss::Channel) -> Vec<Episode> {
    channel.items().iter().filter_map(parse_item).collect()
}

fn parse_item(item: &rss::Item) -> Option<Episode> {
    let enclosure = item.enclosure()?;
    let url = Url::parse(enclosure.url()).ok()?;

    let title = item
        .title()
        .map(|t| html_escape::decode_html_entities(t).into_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let published_at = published_timestamp(item).unwrap_or_else(Utc::now);

    Some(Episode {
        url,
        title,
        published_at,
    })
}

/// Publish time of an item: a numeric `timePublished` extension wins when
/// present and positive, then the textual `pubDate`
fn published_timestamp(item: &rss::Item) -> Option<DateTime<Utc>> {
    if let Some(secs) = numeric_time_published(item)
        && secs > 0
        && let Some(dt) = DateTime::from_timestamp(secs, 0)
    {
        return Some(dt);
    }

    item.pub_date()
        .and_then(|date_str| {
            DateTime::parse_from_rfc2822(date_str)
                .or_else(|_| parse_relaxed_date(date_str))
                .ok()
        })
        .map(|dt| dt.with_timezone(&Utc))
}

/// Epoch seconds from a `timePublished` extension element in any namespace,
/// as emitted by some hosting providers
fn numeric_time_published(item: &rss::Item) -> Option<i64> {
    item.extensions()
        .values()
        .flat_map(|names| names.get("timePublished"))
        .flatten()
        .find_map(|ext| ext.value().and_then(|v| v.trim().parse().ok()))
}

/// Try to parse dates that don't strictly conform to RFC 2822
fn parse_relaxed_date(date_str: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    // Try common alternative formats
    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];

    for format in formats {
        if let Ok(dt) = DateTime::parse_from_str(date_str, format) {
            return Ok(dt);
        }
    }

    Err(chrono::DateTime::parse_from_rfc2822("invalid").unwrap_err())
}
