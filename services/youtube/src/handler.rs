//! Request orchestration: cache lookup, token exchange, live status probe, cache write.

use crate::cache::StatusCache;
use crate::config::{ConfigError, Credentials};
use crate::oauth::TokenExchanger;
use crate::status::{StatusRecord, TOKEN_FAILURE_MESSAGE};
use crate::youtube_api::YouTubeClient;
use http::StatusCode;

/// What one request produces: an HTTP status and the JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: StatusCode,
    pub body: StatusRecord,
}

impl StatusResponse {
    fn ok(body: StatusRecord) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

/// Answers "is the channel live?" for every inbound request.
///
/// Credentials are resolved once, before the first request; a configuration error is kept
/// and reported on every request rather than stopping the process.
#[derive(Debug)]
pub struct StatusHandler<C> {
    credentials: Result<Credentials, ConfigError>,
    exchanger: TokenExchanger,
    youtube: YouTubeClient,
    cache: C,
}

impl<C: StatusCache> StatusHandler<C> {
    pub fn new(
        credentials: Result<Credentials, ConfigError>,
        exchanger: TokenExchanger,
        youtube: YouTubeClient,
        cache: C,
    ) -> Self {
        Self {
            credentials,
            exchanger,
            youtube,
            cache,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Produces the response for one request.
    ///
    /// Only a configuration problem yields a non-200 status, and that path never touches the
    /// cache. Every other outcome, upstream failures included, is cached and returned with
    /// `200 OK` so clients can always parse the body.
    #[tracing::instrument(skip(self), fields(status = tracing::field::Empty))]
    pub async fn handle(&self) -> StatusResponse {
        let credentials = match &self.credentials {
            Ok(credentials) => credentials,
            Err(e) => {
                return StatusResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: StatusRecord::unknown(e.to_string()),
                };
            }
        };

        if let Some(cached) = self.cache.get().await {
            tracing::debug!("serving cached status");
            return StatusResponse::ok(cached);
        }
        tracing::debug!("cache miss, asking YouTube");

        let record = match self.exchanger.exchange(credentials).await {
            Ok(access_token) => self.youtube.live_status(&access_token).await,
            Err(_) => StatusRecord::error(TOKEN_FAILURE_MESSAGE),
        };

        if let Err(e) = self.cache.set(&record).await {
            tracing::warn!(error = %format!("{e:#}"), "failed to cache live status");
        }

        tracing::Span::current().record("status", tracing::field::debug(&record));
        StatusResponse::ok(record)
    }
}
