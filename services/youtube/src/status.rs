//! The JSON document returned to clients.

use serde::{Deserialize, Serialize};

/// Message used when the OAuth refresh-token exchange does not yield an access token.
pub const TOKEN_FAILURE_MESSAGE: &str = "Failed to get access token";

/// Message used when the `liveBroadcasts.list` call fails or returns something unusable.
pub const API_FAILURE_MESSAGE: &str = "API request failed";

/// Live status of the watched channel, as served over HTTP and stored in the cache.
///
/// The variant is carried in the `status` field of the serialized object, so exactly one of
/// the four shapes below is ever emitted:
///
/// ```json
/// {"status":"live","title":"...","viewers":42,"started":"...","thumbnail":"..."}
/// {"status":"offline","title":null,"viewers":0}
/// {"status":"error","message":"..."}
/// {"status":"unknown","error":"..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusRecord {
    /// At least one broadcast is currently active.
    Live {
        title: String,
        viewers: u64,
        /// `actualStartTime` of the broadcast, passed through as YouTube formatted it.
        started: Option<String>,
        /// URL of the medium-sized thumbnail.
        thumbnail: Option<String>,
    },
    /// No active broadcast.
    ///
    /// `title` is always `None` and `viewers` always `0` for records produced by
    /// [`StatusRecord::offline`]; the fields exist so the wire shape stays stable for clients
    /// that read them unconditionally.
    Offline { title: Option<String>, viewers: u64 },
    /// An upstream call failed. The message is one of the fixed strings in this module.
    Error { message: String },
    /// The service itself is misconfigured.
    Unknown { error: String },
}

impl StatusRecord {
    pub fn offline() -> Self {
        Self::Offline {
            title: None,
            viewers: 0,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn unknown(error: impl Into<String>) -> Self {
        Self::Unknown {
            error: error.into(),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}
