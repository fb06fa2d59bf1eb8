//! # youtube-live-status
//!
//! A tiny HTTP service that answers one question: is the configured YouTube channel live
//! right now?
//!
//! On a cache miss it trades a stored OAuth refresh token for an access token, asks the
//! YouTube Live Broadcasts API for active broadcasts, and reshapes the answer into a
//! [`StatusRecord`](status::StatusRecord). Results, failures included, are cached in a single
//! file for [`CACHE_TTL`](cache::CACHE_TTL) to stay within API quota.

use crate::cache::FileCache;
use crate::config::{Config, Credentials};
use crate::handler::StatusHandler;
use crate::oauth::TokenExchanger;
use crate::youtube_api::YouTubeClient;
use std::time::Duration;

pub mod cache;
pub mod config;
pub mod handler;
pub mod oauth;
pub mod server;
pub mod status;
pub mod youtube_api;

/// Upper bound on each outbound call (token exchange, broadcast listing).
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the file-cached handler described by `config`.
///
/// Credentials are read from the environment and `config.credentials_path` here, once. A
/// credentials problem does not fail setup; it is logged and then reported by the handler on
/// every request.
pub fn setup_status_handler(config: &Config) -> eyre::Result<StatusHandler<FileCache>> {
    let credentials = Credentials::load(&config.credentials_path, |key| std::env::var(key).ok());
    if let Err(e) = &credentials {
        tracing::error!(
            path = %config.credentials_path.display(),
            error = %e,
            "OAuth credentials unavailable; every request will fail until this is fixed"
        );
    }

    let exchanger = TokenExchanger::new(config.token_url.clone())?;
    let youtube = YouTubeClient::new(config.broadcasts_url.clone())?;
    let cache = FileCache::new(&config.cache_path);

    Ok(StatusHandler::new(credentials, exchanger, youtube, cache))
}
