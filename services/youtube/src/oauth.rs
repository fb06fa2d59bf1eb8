//! OAuth 2.0 refresh-token exchange for YouTube API access.
//!
//! The service never runs an interactive authorization flow. It holds a long-lived refresh
//! token (obtained once by the operator) and trades it for a fresh access token on every
//! cache miss. Access tokens are never stored or reused across requests.

use crate::UPSTREAM_TIMEOUT;
use crate::config::Credentials;
use eyre::Context;
use oauth2::{AccessToken, TokenUrl};
use serde::Deserialize;

/// Why a refresh-token exchange did not produce an access token.
///
/// None of this is ever shown to clients; the handler collapses every variant into the
/// same in-band error record.
#[derive(Debug, thiserror::Error)]
pub enum TokenExchangeError {
    /// The token endpoint answered with something other than `200 OK` (e.g. `invalid_grant`).
    #[error("token endpoint answered {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The request never completed (connection failure, timeout, ...). Displays the whole
    /// cause chain.
    #[error("token request failed: {0:#}")]
    Request(eyre::Report),
    /// The endpoint answered `200 OK`, but the body is not a JSON object.
    #[error("token response could not be parsed ({reason}): {body}")]
    Parse { reason: String, body: String },
    /// The body parsed, but carries no usable `access_token`.
    #[error("token response has no access_token: {body}")]
    MissingAccessToken { body: String },
}

impl From<reqwest::Error> for TokenExchangeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(eyre::Report::new(e))
    }
}

/// The one field we need from the token endpoint. `token_type`, `expires_in` and `scope`
/// are ignored, and so is the response `Content-Type`.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Exchanges the configured refresh token for a short-lived access token.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    token_url: TokenUrl,
    http_client: reqwest::Client,
}

impl TokenExchanger {
    /// Creates an exchanger that talks to `token_url`.
    pub fn new(token_url: TokenUrl) -> eyre::Result<Self> {
        let http_client = reqwest::ClientBuilder::new()
            // SSRF no thank you.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("build OAuth HTTP client")?;

        Ok(Self {
            token_url,
            http_client,
        })
    }

    /// Performs one `grant_type=refresh_token` POST.
    ///
    /// The client id and secret travel in the form body rather than in an HTTP Basic
    /// `Authorization` header. Only `200 OK` with a non-empty `access_token` counts as
    /// success. Failures are logged here with whatever detail the endpoint returned, and
    /// handed back as a [`TokenExchangeError`].
    #[tracing::instrument(skip_all, fields(token_url = %self.token_url.as_str()))]
    pub async fn exchange(
        &self,
        credentials: &Credentials,
    ) -> Result<AccessToken, TokenExchangeError> {
        match self.request_token(credentials).await {
            Ok(token) => {
                tracing::debug!("exchanged refresh token for access token");
                Ok(token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "OAuth token refresh failed");
                Err(e)
            }
        }
    }

    async fn request_token(
        &self,
        credentials: &Credentials,
    ) -> Result<AccessToken, TokenExchangeError> {
        let response = self
            .http_client
            .post(self.token_url.as_str())
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.secret().as_str()),
                ("refresh_token", credentials.refresh_token.secret().as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        if status != reqwest::StatusCode::OK {
            return Err(TokenExchangeError::Rejected { status, body });
        }

        let parsed: TokenEndpointResponse = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(e) => {
                return Err(TokenExchangeError::Parse {
                    reason: e.to_string(),
                    body,
                });
            }
        };

        match parsed.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken::new(token)),
            _ => Err(TokenExchangeError::MissingAccessToken { body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2::{ClientId, ClientSecret, RefreshToken};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials {
            client_id: ClientId::new("client-id".to_string()),
            client_secret: ClientSecret::new("client-secret".to_string()),
            refresh_token: RefreshToken::new("refresh-token".to_string()),
        }
    }

    fn exchanger(server: &MockServer) -> TokenExchanger {
        TokenExchanger::new(TokenUrl::new(format!("{}/token", server.uri())).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn returns_access_token_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-token"))
            .and(body_string_contains("client_id=client-id"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.fresh",
                "token_type": "Bearer",
                "expires_in": 3599,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange(&credentials()).await.unwrap();
        assert_eq!(token.secret(), "ya29.fresh");
    }

    #[tokio::test]
    async fn client_secret_is_not_sent_as_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.fresh",
                "token_type": "Bearer",
            })))
            .mount(&server)
            .await;

        assert!(exchanger(&server).exchange(&credentials()).await.is_ok());
    }

    #[tokio::test]
    async fn access_token_alone_is_enough() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.bare",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange(&credentials()).await.unwrap();
        assert_eq!(token.secret(), "ya29.bare");
    }

    #[tokio::test]
    async fn content_type_is_not_checked() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"access_token":"ya29.plain","token_type":"Bearer"}"#)
                    .insert_header("content-type", "text/plain"),
            )
            .mount(&server)
            .await;

        let token = exchanger(&server).exchange(&credentials()).await.unwrap();
        assert_eq!(token.secret(), "ya29.plain");
    }

    #[tokio::test]
    async fn invalid_grant_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked.",
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server)
            .exchange(&credentials())
            .await
            .unwrap_err();
        match &err {
            TokenExchangeError::Rejected { status, body } => {
                assert_eq!(*status, reqwest::StatusCode::BAD_REQUEST);
                assert!(body.contains("invalid_grant"), "{body}");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_200_success_code_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "access_token": "ya29.fresh",
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server)
            .exchange(&credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenExchangeError::Rejected { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn missing_access_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
            })))
            .mount(&server)
            .await;

        let err = exchanger(&server)
            .exchange(&credentials())
            .await
            .unwrap_err();
        assert!(
            matches!(err, TokenExchangeError::MissingAccessToken { .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn empty_access_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": ""})))
            .mount(&server)
            .await;

        let err = exchanger(&server)
            .exchange(&credentials())
            .await
            .unwrap_err();
        assert!(
            matches!(err, TokenExchangeError::MissingAccessToken { .. }),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = exchanger(&server)
            .exchange(&credentials())
            .await
            .unwrap_err();
        match &err {
            TokenExchangeError::Parse { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_reports_the_cause() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let exchanger = TokenExchanger::new(
            TokenUrl::new(format!("http://127.0.0.1:{port}/token")).unwrap(),
        )
        .unwrap();
        let err = exchanger.exchange(&credentials()).await.unwrap_err();
        assert!(matches!(err, TokenExchangeError::Request(_)), "{err:?}");

        // the logged message carries the underlying error, not just the summary
        let message = err.to_string();
        assert!(message.starts_with("token request failed: "), "{message}");
        assert!(message.contains(&format!("127.0.0.1:{port}")), "{message}");
    }
}
