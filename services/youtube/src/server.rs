//! HTTP/1.1 front for the [`StatusHandler`].
//!
//! Every path answers the same way. `GET` runs the handler, `OPTIONS` answers CORS preflight,
//! and anything else gets `405`. All responses carry the JSON content type, the CORS headers
//! and a short public `Cache-Control` so intermediary caches can shield the origin too.

use crate::cache::StatusCache;
use crate::handler::StatusHandler;
use crate::status::StatusRecord;
use eyre::Context;
use http::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CACHE_CONTROL, CONTENT_TYPE,
};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::Full;
use hyper::body::{self, Bytes};
use hyper::service::service_fn;
use hyper::{Request, Response};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Lifetime hint for browsers and proxies. Deliberately shorter than the server-side TTL.
pub const CLIENT_CACHE_CONTROL: &str = "public, max-age=30";

/// Pause after a failed `accept`, so a persistent error such as running out of file
/// descriptors does not turn the loop into a busy spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Serves `handler` on `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task. Connections already accepted when `shutdown`
/// fires are left to finish on their own.
pub async fn serve<C, S>(
    listener: TcpListener,
    handler: Arc<StatusHandler<C>>,
    allowed_origin: HeaderValue,
    shutdown: S,
) -> eyre::Result<()>
where
    C: StatusCache + 'static,
    S: Future<Output = ()>,
{
    let addr = listener.local_addr().context("get local address")?;
    tracing::info!(%addr, "serving live status");

    let mut shutdown = std::pin::pin!(shutdown);
    loop {
        let (conn, peer) = tokio::select! {
            accepted = accept_with_backoff(|| listener.accept()) => accepted,
            () = &mut shutdown => {
                tracing::info!("shutting down");
                return Ok(());
            }
        };

        let conn = hyper_util::rt::TokioIo::new(conn);
        let handler = Arc::clone(&handler);
        let allowed_origin = allowed_origin.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<body::Incoming>| {
                let handler = Arc::clone(&handler);
                let allowed_origin = allowed_origin.clone();
                async move { respond(&handler, &allowed_origin, req.method()).await }
            });
            if let Err(e) = hyper::server::conn::http1::Builder::new()
                .serve_connection(conn, service)
                .await
            {
                tracing::warn!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn accept_with_backoff<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }
}

#[tracing::instrument(skip(handler, allowed_origin))]
async fn respond<C: StatusCache>(
    handler: &StatusHandler<C>,
    allowed_origin: &HeaderValue,
    method: &Method,
) -> Result<Response<Full<Bytes>>, http::Error> {
    let response = Response::builder()
        .header(CONTENT_TYPE, "application/json")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin)
        .header(ACCESS_CONTROL_ALLOW_METHODS, "GET")
        .header(CACHE_CONTROL, CLIENT_CACHE_CONTROL);

    match *method {
        Method::GET => {
            let outcome = handler.handle().await;
            response.status(outcome.status).body(json(&outcome.body))
        }
        Method::OPTIONS => response
            .status(StatusCode::NO_CONTENT)
            .body(Full::new(Bytes::new())),
        _ => response
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(ALLOW, "GET, OPTIONS")
            .body(json(&StatusRecord::error("Method not allowed"))),
    }
}

fn json(record: &StatusRecord) -> Full<Bytes> {
    Full::from(serde_json::to_vec(record).expect("status records always serialize"))
}
