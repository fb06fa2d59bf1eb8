use eyre::Context;
use http::{HeaderValue, StatusCode};
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_live_status::config::Config;
use youtube_live_status::{server, setup_status_handler};

const USAGE: &str = "usage: youtube-live-status [serve|check]";

#[tokio::main]
async fn main() -> eyre::Result<ExitCode> {
    // stdout is reserved for `check` output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let mode = std::env::args().nth(1);
    let config = Config::from_env().context("load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match mode.as_deref() {
        None | Some("serve") => {
            let allowed_origin = HeaderValue::from_str(&config.allowed_origin)
                .context("parse allowed origin")?;
            let handler = Arc::new(setup_status_handler(&config)?);
            let listener = tokio::net::TcpListener::bind(config.listen_addr)
                .await
                .with_context(|| format!("bind to {}", config.listen_addr))?;

            server::serve(listener, handler, allowed_origin, async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await?;

            Ok(ExitCode::SUCCESS)
        }
        Some("check") => {
            let handler = setup_status_handler(&config)?;
            let response = handler.handle().await;
            println!(
                "{}",
                serde_json::to_string(&response.body).context("serialize status")?
            );
            if response.status == StatusCode::OK {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Some(other) => {
            eprintln!("unknown mode '{other}'\n{USAGE}");
            Ok(ExitCode::from(2))
        }
    }
}
