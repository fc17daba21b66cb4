//! HTTP server exposing the community tools.
//!
//! Serves a plain JSON API suitable for scripting plus a streamable MCP
//! endpoint for agent clients. Both surfaces dispatch through the same
//! [`ToolRegistry`], so a tool registered once is reachable everywhere.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Liveness check (returns `OK`) |
//! | `*`    | `/mcp` | Streamable HTTP MCP endpoint |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "invalid_argument", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `invalid_argument` (400), `unsupported_format` (400),
//! `not_found` (404), `missing_field` (502), `backend_error` (502),
//! `backend_unavailable` (503), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients and cross-origin MCP tool calls.
//!
//! # Cursor Integration
//!
//! Add the following to your Cursor MCP configuration:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "igloo": {
//!       "command": "igloo-mcp",
//!       "args": ["--config", "/path/to/igloo-mcp.toml", "serve", "mcp"]
//!     }
//!   }
//! }
//! ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::SourceError;
use crate::mcp::McpBridge;
use crate::tools::{ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    tools: Arc<ToolRegistry>,
}

/// Starts the HTTP server with the built-in tools.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated. This is the entry point used by the
/// `igloo-mcp serve mcp` command. For custom binaries with Rust tool
/// extensions, use [`run_server_with_extensions`] instead.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, ToolRegistry::new()).await
}

/// Starts the HTTP server with custom Rust tool extensions.
///
/// Like [`run_server`], but merges `extra_tools` into the registry after
/// the built-ins. Extra tools appear in `GET /tools/list`, can be called
/// via `POST /tools/{name}`, and are visible over MCP.
pub async fn run_server_with_extensions(
    config: &Config,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("igloo_mcp=info")),
        )
        .with_target(false)
        .init();

    let bind_addr = config.server.bind.clone();
    let config = Arc::new(config.clone());

    let mut registry = ToolRegistry::with_builtins();
    for tool in extra_tools.into_tools() {
        registry.register(tool);
    }
    for tool in registry.tools() {
        tracing::debug!("registered tool: {}", tool.name());
    }

    let state = AppState {
        config: config.clone(),
        tools: Arc::new(registry),
    };

    let bridge = McpBridge::new(config, state.tools.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(bridge.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .nest_service("/mcp", mcp_service)
        .layer(cors)
        .with_state(state);

    tracing::info!("listening on http://{}", bind_addr);
    tracing::info!("MCP endpoint at http://{}/mcp", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn app_error(status: StatusCode, code: &str, message: impl Into<String>) -> AppError {
    AppError {
        status,
        code: code.to_string(),
        message: message.into(),
    }
}

/// Constructs a 404 Not Found error.
fn not_found(message: impl Into<String>) -> AppError {
    app_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Constructs a 500 error for unclassified tool failures.
fn tool_error(message: impl Into<String>) -> AppError {
    app_error(StatusCode::INTERNAL_SERVER_ERROR, "tool_error", message)
}

/// Maps tool execution errors to HTTP responses.
///
/// Caller mistakes (bad arguments, unconvertible formats) come back as
/// 4xx; a backend that broke the record contract or went away is a
/// gateway problem, so those map to 502/503. Anything a tool raises
/// outside the [`SourceError`] taxonomy falls through to 500.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {}", tool_name, err);

    match err.downcast_ref::<SourceError>() {
        Some(SourceError::InvalidArgument(_)) => {
            app_error(StatusCode::BAD_REQUEST, "invalid_argument", message)
        }
        Some(SourceError::UnsupportedFormat(_)) => {
            app_error(StatusCode::BAD_REQUEST, "unsupported_format", message)
        }
        Some(SourceError::NotFound(_)) => not_found(message),
        Some(SourceError::MissingField(_)) => {
            app_error(StatusCode::BAD_GATEWAY, "missing_field", message)
        }
        Some(SourceError::BackendError(_)) => {
            app_error(StatusCode::BAD_GATEWAY, "backend_error", message)
        }
        Some(SourceError::BackendUnavailable(_)) => {
            app_error(StatusCode::SERVICE_UNAVAILABLE, "backend_unavailable", message)
        }
        None => tool_error(message),
    }
}

// ============ GET /health ============

/// Handler for `GET /health`.
///
/// Returns a bare `OK` for load balancers and monitoring probes. No
/// backend call is made; this reports only that the server is up.
async fn handle_health() -> &'static str {
    "OK"
}

// ============ GET /tools/list ============

/// JSON response body for `GET /tools/list`.
#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

/// Handler for `GET /tools/list`.
///
/// Returns all registered tools with their parameter schemas.
async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters_schema(),
        })
        .collect();

    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

/// Handler for `POST /tools/{name}`.
///
/// Unified tool dispatch: looks up the tool by name, executes it, and
/// wraps its output in `{ "result": ... }`. Returns `404` if no tool has
/// that name; execution failures go through [`classify_tool_error`].
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let ctx = ToolContext::new(state.config.clone());
    let result = tool
        .execute(params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
