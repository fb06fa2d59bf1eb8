//! YouTube Live Broadcasts API types and the mapping to [`StatusRecord`].
//!
//! Every field here is optional. YouTube omits parts it considers irrelevant (a broadcast
//! with hidden statistics has no `statistics`, a fresh one may lack thumbnails), and a
//! missing leaf must only default that leaf rather than fail the whole request. All
//! defaulting happens in one place: `From<LiveBroadcastListResponse> for StatusRecord`.

use crate::status::StatusRecord;
use serde::{Deserialize, Serialize};

/// Title reported for a live broadcast whose snippet carries no title.
pub const DEFAULT_LIVE_TITLE: &str = "Live Stream";

/// Response structure for the `liveBroadcasts.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/list>
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LiveBroadcastListResponse {
    /// Broadcasts matching the request, in the order YouTube returned them.
    #[serde(default)]
    pub items: Vec<LiveBroadcast>,
}

/// A `liveBroadcast` resource, reduced to the parts the status page reads.
///
/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#resource>
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LiveBroadcast {
    #[serde(default)]
    pub snippet: Option<LiveBroadcastSnippet>,
    #[serde(default)]
    pub statistics: Option<LiveBroadcastStatistics>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#snippet>
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastSnippet {
    #[serde(default)]
    pub title: Option<String>,
    /// ISO 8601. Kept as text so the client sees exactly what YouTube sent.
    #[serde(default)]
    pub actual_start_time: Option<String>,
    #[serde(default)]
    pub thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Thumbnails {
    #[serde(default)]
    pub medium: Option<Thumbnail>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts#statistics>
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveBroadcastStatistics {
    /// Documented as an unsigned long, but delivered as a JSON string. Accept either.
    #[serde(default)]
    pub concurrent_viewers: Option<serde_json::Value>,
}

impl LiveBroadcastStatistics {
    /// Viewer count as a non-negative integer; anything unusable counts as zero.
    pub fn viewers(&self) -> u64 {
        match &self.concurrent_viewers {
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f as u64)
                })
                .unwrap_or(0),
            Some(serde_json::Value::String(s)) => parse_viewers(s),
            _ => 0,
        }
    }
}

fn parse_viewers(s: &str) -> u64 {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return n;
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f as u64,
        _ => 0,
    }
}

impl From<LiveBroadcastListResponse> for StatusRecord {
    /// The first broadcast wins; YouTube's ordering is the only tie-break.
    fn from(response: LiveBroadcastListResponse) -> Self {
        let Some(broadcast) = response.items.into_iter().next() else {
            return StatusRecord::offline();
        };

        let viewers = broadcast
            .statistics
            .as_ref()
            .map_or(0, LiveBroadcastStatistics::viewers);
        let snippet = broadcast.snippet.unwrap_or_default();
        let thumbnail = snippet
            .thumbnails
            .and_then(|t| t.medium)
            .and_then(|m| m.url);

        StatusRecord::Live {
            title: snippet
                .title
                .unwrap_or_else(|| DEFAULT_LIVE_TITLE.to_string()),
            viewers,
            started: snippet.actual_start_time,
            thumbnail,
        }
    }
}
