//! Oikos Orchard & Farm form server.
//!
//! Configuration comes from environment variables, optionally loaded from a
//! `.env` file in the working directory.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use anyhow::Context;
use oikos::{AppState, router};
use oikos_core::{AppConfig, Channels, IntakeService, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oikos=info,oikos_core=info,oikos_smtp=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    info!(
        smtp_host = %config.mail.smtp.host,
        smtp_port = config.mail.smtp.port,
        twilio = config.twilio.is_some(),
        sms_gateways = config.sms_gateways.carriers.len(),
        fcm = config.fcm.is_some(),
        sheets = config.sheets.is_some(),
        "configuration loaded"
    );

    let http = reqwest::Client::builder()
        .user_agent(concat!("oikos/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")?;
    let channels = Channels::from_config(&config, http)
        .await
        .context("setting up notification channels")?;

    let intake = IntakeService::new(&config, channels)?;
    intake
        .store()
        .ensure_dir()
        .await
        .with_context(|| format!("creating {}", config.storage.data_dir.display()))?;

    let state = AppState {
        intake: Arc::new(intake),
        limiter: Arc::new(RateLimiter::new(config.rate_limit)),
    };

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
