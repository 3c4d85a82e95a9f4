use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// What a module sees during `init` and `start`.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// Schema statement contributed by a module.
///
/// Statements must be idempotent: they run on every startup and there is no
/// record of which ones were applied before.
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// A self-contained slice of the service: its routes, API documentation,
/// tables and lifecycle hooks.
///
/// Lifecycle order is `init`, schema application, `start`, serving, `stop`.
#[async_trait]
pub trait Module: Sync + Send {
    /// Registry key; also used to order migrations.
    fn name(&self) -> &'static str;

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes with absolute paths and their state already applied.
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment (`paths` and `components.schemas`) for this module,
    /// merged into the service document.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    fn migrations(&self) -> Vec<Migration> {
        Vec::new()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the server has drained, in reverse registration order.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
