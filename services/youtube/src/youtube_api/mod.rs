//! YouTube Data API v3 access for live status checks.
//!
//! Only one endpoint is used: `liveBroadcasts.list` filtered to broadcasts that are active
//! right now. [`client::YouTubeClient`] performs the authenticated request and
//! [`broadcasts`] holds the partially decoded response together with its mapping into a
//! [`StatusRecord`](crate::status::StatusRecord).
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use youtube_live_status::youtube_api::YouTubeClient;
//! use oauth2::AccessToken;
//!
//! # async fn example(access_token: AccessToken) -> eyre::Result<()> {
//! let client = YouTubeClient::new(
//!     "https://www.googleapis.com/youtube/v3/liveBroadcasts".parse()?,
//! )?;
//! let status = client.live_status(&access_token).await;
//! println!("{}", serde_json::to_string(&status)?);
//! # Ok(())
//! # }
//! ```

pub mod broadcasts;
pub mod client;

pub use broadcasts::{
    LiveBroadcast, LiveBroadcastListResponse, LiveBroadcastSnippet, LiveBroadcastStatistics,
};
pub use client::YouTubeClient;
