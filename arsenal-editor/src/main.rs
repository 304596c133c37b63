//! ARSENAL Editor Server Entry Point
//!
//! Bootstraps logging, registers the built-in parsers, and starts the Axum
//! server with the WebSocket session endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use arsenal_editor::error::{EditorError, EditorResult};
use arsenal_editor::{create_router, EditorConfig, EditorState};
use arsenal_llm::providers::completion::CompletionParser;
use arsenal_llm::ParserRegistry;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> EditorResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EditorConfig::from_env();
    let registry = ParserRegistry::global();
    registry.register(Arc::new(CompletionParser::new()), None)?;

    let addr = resolve_bind_addr(&config)?;
    let state = Arc::new(EditorState::new(config, registry));
    let app = create_router(state);

    tracing::info!(%addr, "Starting ARSENAL editor server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr(config: &EditorConfig) -> EditorResult<SocketAddr> {
    let addr = config.bind_addr();
    addr.parse::<SocketAddr>().map_err(|e| EditorError::InvalidBindAddr {
        addr,
        reason: e.to_string(),
    })
}
