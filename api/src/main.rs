//! Asset Score API Server
//!
//! REST API for tokenomics snapshots and composite asset-quality scores.

use std::{env, net::SocketAddr, sync::Arc};

use axum::{routing::get, Router};
use scorer::Engine;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
}

mod defaults {
    pub const API_PORT: &str = "8080";
    pub const API_HOST: &str = "0.0.0.0";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=debug,scorer=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Asset Score API Server...");

    let engine = Engine::from_env().await?;
    let state = Arc::new(AppState { engine });

    let app = app(state);

    // Get port from environment
    let port = env::var("API_PORT")
        .unwrap_or_else(|_| defaults::API_PORT.to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    let host = env::var("API_HOST").unwrap_or_else(|_| defaults::API_HOST.to_string());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router with middleware
pub fn app(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Root endpoint with API info
        .route("/", get(root))
        // Health check
        .route("/health", get(health_check))
        // API routes
        .nest("/api", routes::api_routes())
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Root endpoint - API information
async fn root() -> axum::response::Html<&'static str> {
    axum::response::Html(r#"
<!DOCTYPE html>
<html>
<head>
    <title>Asset Score API</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; background: #1a1a2e; color: #eee; }
        h1 { color: #f5a623; }
        a { color: #4fc3f7; }
        code { background: #333; padding: 2px 6px; border-radius: 4px; }
        .endpoint { margin: 10px 0; padding: 10px; background: #252540; border-radius: 8px; }
        .method { color: #4caf50; font-weight: bold; }
    </style>
</head>
<body>
    <h1>Asset Score API</h1>
    <p>Tokenomics and composite quality scores for crypto assets</p>

    <h2>Endpoints</h2>

    <div class="endpoint">
        <span class="method">GET</span> <a href="/health">/health</a> - Health check
    </div>

    <h3>Assets</h3>
    <div class="endpoint">
        <span class="method">GET</span> <a href="/api/tokenomics/bitcoin">/api/tokenomics/:id</a> - Supply and market cap
    </div>
    <div class="endpoint">
        <span class="method">GET</span> <a href="/api/score/bitcoin">/api/score/:id</a> - Composite score with breakdown
    </div>
    <div class="endpoint">
        <span class="method">GET</span> <a href="/api/alias/btc">/api/alias/:term</a> - Resolve symbol or name to coin id
    </div>

    <h3>Cache</h3>
    <div class="endpoint">
        <span class="method">GET</span> <a href="/api/cache-stats">/api/cache-stats</a> - Cache statistics
    </div>
    <div class="endpoint">
        <span class="method">POST</span> <code>/api/update-cache</code> - Refresh <code>coin_id</code>, <code>coin_ids</code> or <code>popular</code> coins
    </div>
    <div class="endpoint">
        <span class="method">POST</span> <code>/api/update-aliases</code> - Rebuild the alias table
    </div>
</body>
</html>
    "#)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
