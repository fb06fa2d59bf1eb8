//! Authenticated access to the `liveBroadcasts.list` endpoint.

use crate::UPSTREAM_TIMEOUT;
use crate::status::{API_FAILURE_MESSAGE, StatusRecord};
use crate::youtube_api::broadcasts::LiveBroadcastListResponse;
use eyre::Context;
use oauth2::AccessToken;
use reqwest::{StatusCode, Url};
use tracing::instrument;

/// `part` values requested from `liveBroadcasts.list`.
const BROADCAST_PARTS: &str = "snippet,status,statistics";

/// Client for the YouTube Data API v3 live broadcast listing.
///
/// Unlike a long-lived API client this one holds no token: the caller obtains a fresh
/// access token for every probe and passes it in.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    broadcasts_url: Url,
    client: reqwest::Client,
}

impl YouTubeClient {
    /// Creates a client that queries `broadcasts_url`.
    pub fn new(broadcasts_url: Url) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("build YouTube API HTTP client")?;
        Ok(Self {
            broadcasts_url,
            client,
        })
    }

    /// Lists the broadcasts that are active right now.
    ///
    /// `broadcastType=all` covers both scheduled events and the persistent "stream now"
    /// broadcast, so a channel that went live without scheduling is still found.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, YouTube answers with anything but `200 OK`
    /// (the error includes the response body), or the body is not a broadcast list.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/live/docs/liveBroadcasts/list>
    #[instrument(skip_all, fields(url = %self.broadcasts_url))]
    pub async fn list_active_broadcasts(
        &self,
        access_token: &AccessToken,
    ) -> eyre::Result<LiveBroadcastListResponse> {
        let query_params = [
            ("part", BROADCAST_PARTS),
            ("broadcastStatus", "active"),
            ("broadcastType", "all"),
        ];

        let response = self
            .client
            .get(self.broadcasts_url.clone())
            .bearer_auth(access_token.secret())
            .query(&query_params)
            .send()
            .await
            .context("send liveBroadcasts.list request to YouTube API")?;

        let status_code = response.status();
        if status_code != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            eyre::bail!(
                "YouTube API liveBroadcasts.list failed with status {}: {}",
                status_code,
                error_text
            );
        }

        let live_broadcasts: LiveBroadcastListResponse = response
            .json()
            .await
            .context("parse YouTube API response as JSON")?;

        tracing::debug!(
            returned_items = live_broadcasts.items.len(),
            "fetched active live broadcasts"
        );

        Ok(live_broadcasts)
    }

    /// Determines the channel's live status.
    ///
    /// Never fails: any problem with the upstream call is logged and reported as an
    /// in-band error record.
    pub async fn live_status(&self, access_token: &AccessToken) -> StatusRecord {
        match self.list_active_broadcasts(access_token).await {
            Ok(broadcasts) => StatusRecord::from(broadcasts),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "YouTube API request failed");
                StatusRecord::error(API_FAILURE_MESSAGE)
            }
        }
    }
}
