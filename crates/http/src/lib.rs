//! HTTP server facade for the library service with Axum, error handling, and OpenAPI support.

use std::future::Future;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use library_kernel::{settings::Settings, ModuleRegistry};

pub mod docs;
pub mod error;
pub mod extract;
pub mod router;

pub use error::AppError;
pub use extract::{path_number, JsonBody, PathParams};

use router::RouterBuilder;

/// Start the HTTP server and run it until `shutdown` resolves
pub async fn start_server<F>(
    registry: &ModuleRegistry,
    settings: &Settings,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    tracing::info!(
        "starting HTTP server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    let app = build_router(registry, settings);

    let listener = TcpListener::bind((settings.server.host.as_str(), settings.server.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    let grace = Duration::from_secs(settings.server.shutdown_grace_secs);
    serve_until(listener, app, shutdown, grace).await
}

/// Build the main HTTP router with all module routes merged
pub fn build_router(registry: &ModuleRegistry, settings: &Settings) -> Router {
    let mut router_builder = RouterBuilder::new().route("/healthz", get(health_check));

    for module in registry.modules() {
        tracing::info!(module = module.name(), "mounting module routes");
        router_builder = router_builder.merge_module(module.routes());
    }

    // Layers wrap only the routes registered before them.
    router_builder
        .with_openapi(registry)
        .with_timeout(settings.server.request_timeout_ms)
        .with_cors()
        .with_tracing()
        .with_request_id()
        .build()
}

/// Serve `app` until `shutdown` resolves, then give in-flight requests up to
/// `grace` to finish before dropping them.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                stop_rx.await.ok();
                tracing::info!("HTTP server received shutdown signal");
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined.context("HTTP server task panicked")?.context("HTTP server failed")?;
            return Ok(());
        }
        _ = shutdown => {}
    }

    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => {
            joined
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
            tracing::info!("HTTP server stopped");
        }
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "grace period elapsed; aborting in-flight requests"
            );
            server.abort();
        }
    }

    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}
