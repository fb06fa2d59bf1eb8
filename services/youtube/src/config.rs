//! Runtime configuration and OAuth credential loading.
//!
//! Settings come from `YTL_*` environment variables with built-in defaults. The three OAuth
//! secrets live in a JSON file outside any web root, and individual fields may be overridden
//! through `YOUTUBE_*` environment variables.

use eyre::Context;
use oauth2::{ClientId, ClientSecret, RefreshToken, TokenUrl};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_CREDENTIALS_PATH: &str = "/etc/youtube-live-status/credentials.json";
pub const DEFAULT_CACHE_PATH: &str = "/tmp/youtube_status_cache.json";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "*";

/// Google OAuth2 token endpoint used for the refresh-token grant.
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// YouTube Data API v3 `liveBroadcasts.list` endpoint.
pub const DEFAULT_BROADCASTS_URL: &str = "https://www.googleapis.com/youtube/v3/liveBroadcasts";

/// Why the OAuth credentials could not be loaded.
///
/// The `Display` text is what clients see in the `error` field of the `unknown` status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Neither the credentials file nor any credential environment variable exists.
    #[error("Config file not found")]
    NotFound,
    /// Configuration exists but at least one secret is missing, empty, or unreadable.
    #[error("Missing OAuth credentials in config")]
    MissingCredentials,
}

/// The three secrets needed for the refresh-token grant.
///
/// Every field is an `oauth2` newtype, so `Debug` output never shows the secret values.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub refresh_token: RefreshToken,
}

/// On-disk shape of the credentials file. Fields are optional so that a partially filled
/// file can be completed from the environment.
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
}

impl Credentials {
    /// Loads credentials from `path`, then applies `YOUTUBE_CLIENT_ID`,
    /// `YOUTUBE_CLIENT_SECRET` and `YOUTUBE_REFRESH_TOKEN` from `lookup` on top.
    pub fn load<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_file = match std::fs::read(path) {
            Ok(bytes) => Some(serde_json::from_slice::<CredentialsFile>(&bytes).map_err(|e| {
                tracing::warn!(path = %path.display(), error = %e, "credentials file is not valid JSON");
                ConfigError::MissingCredentials
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read credentials file");
                return Err(ConfigError::MissingCredentials);
            }
        };

        let env_client_id = lookup("YOUTUBE_CLIENT_ID");
        let env_client_secret = lookup("YOUTUBE_CLIENT_SECRET");
        let env_refresh_token = lookup("YOUTUBE_REFRESH_TOKEN");

        if from_file.is_none()
            && env_client_id.is_none()
            && env_client_secret.is_none()
            && env_refresh_token.is_none()
        {
            return Err(ConfigError::NotFound);
        }

        let file = from_file.unwrap_or_default();
        let pick = |env: Option<String>, file: Option<String>| {
            env.or(file)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingCredentials)
        };

        Ok(Self {
            client_id: ClientId::new(pick(env_client_id, file.client_id)?),
            client_secret: ClientSecret::new(pick(env_client_secret, file.client_secret)?),
            refresh_token: RefreshToken::new(pick(env_refresh_token, file.refresh_token)?),
        })
    }
}

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub credentials_path: PathBuf,
    pub cache_path: PathBuf,
    pub allowed_origin: String,
    pub token_url: TokenUrl,
    pub broadcasts_url: reqwest::Url,
}

impl Config {
    /// Reads settings from the process environment.
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to the defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> eyre::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let listen_addr = get("YTL_LISTEN_ADDR", DEFAULT_LISTEN_ADDR);
        let listen_addr = listen_addr
            .parse()
            .with_context(|| format!("parse YTL_LISTEN_ADDR '{listen_addr}'"))?;

        let token_url = TokenUrl::new(get("YTL_TOKEN_URL", DEFAULT_TOKEN_URL))
            .context("parse YTL_TOKEN_URL")?;
        let broadcasts_url = reqwest::Url::parse(&get("YTL_BROADCASTS_URL", DEFAULT_BROADCASTS_URL))
            .context("parse YTL_BROADCASTS_URL")?;

        let allowed_origin = get("YTL_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN);
        http::HeaderValue::from_str(&allowed_origin)
            .with_context(|| format!("YTL_ALLOWED_ORIGIN '{allowed_origin}' is not a header value"))?;

        Ok(Self {
            listen_addr,
            credentials_path: get("YTL_CREDENTIALS", DEFAULT_CREDENTIALS_PATH).into(),
            cache_path: get("YTL_CACHE_FILE", DEFAULT_CACHE_PATH).into(),
            allowed_origin,
            token_url,
            broadcasts_url,
        })
    }
}
