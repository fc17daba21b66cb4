//! Tool trait, registry, and the built-in `search` / `get_content` tools.
//!
//! Every tool — built-in or a custom Rust extension — is registered in a
//! [`ToolRegistry`] and dispatched through the same `POST /tools/{name}`
//! HTTP handler and the same MCP `call_tool` bridge.
//!
//! # Usage
//!
//! ```rust
//! use igloo_mcp::tools::ToolRegistry;
//!
//! let mut tools = ToolRegistry::with_builtins();
//! // tools.register(Box::new(MyTool));
//! assert_eq!(tools.len(), 2);
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::error::SourceError;
use crate::get::fetch_page_markdown;
use crate::models::SearchResult;
use crate::search::search_community;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// Implement this trait to serve a custom tool alongside the built-in
/// `search` and `get_content`. Tools are registered at server startup
/// and exposed via `GET /tools/list` for discovery and
/// `POST /tools/{name}` for invocation.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use igloo_mcp::tools::{Tool, ToolContext};
///
/// pub struct PingTool;
///
/// #[async_trait]
/// impl Tool for PingTool {
///     fn name(&self) -> &str { "ping" }
///     fn description(&self) -> &str { "Check that the server is alive" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {}, "required": [] })
///     }
///
///     async fn execute(&self, _params: Value, _ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "pong": true }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's name.
    ///
    /// Used as the route path (`POST /tools/{name}`) and as the MCP tool
    /// name. Should be a lowercase identifier with underscores.
    fn name(&self) -> &str;

    /// Returns a one-line description for agent discovery.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's parameters.
    ///
    /// Must be a valid JSON Schema object with `type: "object"`,
    /// `properties`, and optionally `required`.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool.
    ///
    /// # Arguments
    ///
    /// * `params` — JSON parameters (always a JSON object).
    /// * `ctx` — Bridge to the configured community backend.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Serializable tool descriptor for `GET /tools/list`.
#[derive(Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Context bridge for tool execution.
///
/// Provides tools with access to the configured community backend.
/// Created by the server for each tool invocation. All methods delegate
/// to the same core functions used by the CLI, so custom tools have
/// identical capabilities to the built-ins.
pub struct ToolContext {
    config: Arc<Config>,
}

impl ToolContext {
    /// Create a new tool context from the application config.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Search the community.
    ///
    /// Equivalent to `POST /tools/search` or `igloo-mcp search`. A `None`
    /// limit falls back to the configured `[search].default_limit`.
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<SearchResult>> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        search_community(&self.config, query, limit).await
    }

    /// Retrieve a page as Markdown, by object ID or by community path.
    ///
    /// Equivalent to `POST /tools/get_content` or `igloo-mcp get`.
    pub async fn get_content(&self, id: Option<&str>, href: Option<&str>) -> Result<String> {
        fetch_page_markdown(&self.config, id, href).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Reads an optional string parameter. Empty strings count as absent, so
/// a client sending `{"id": ""}` gets the same treatment as one omitting
/// the key entirely.
fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Built-in search tool. Delegates to [`ToolContext::search`].
pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the Igloo community for pages matching a query"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Search query" },
                "limit": { "type": "integer", "description": "Max results (defaults to the configured search limit)" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            return Err(SourceError::InvalidArgument("query must not be empty".to_string()).into());
        }

        let limit = params["limit"]
            .as_u64()
            .and_then(|v| u32::try_from(v).ok());

        let results = ctx.search(query, limit).await?;
        Ok(serde_json::json!({ "results": results }))
    }
}

/// Built-in content retrieval tool. Delegates to [`ToolContext::get_content`].
pub struct GetContentTool;

#[async_trait]
impl Tool for GetContentTool {
    fn name(&self) -> &str {
        "get_content"
    }

    fn description(&self) -> &str {
        "Retrieve an Igloo page as Markdown, by object ID or by community path"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Object ID of the page" },
                "href": { "type": "string", "description": "Community-relative path, e.g. /engineering/handbook" }
            },
            "required": []
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let id = optional_str(&params, "id");
        let href = optional_str(&params, "href");

        let markdown = ctx.get_content(id, href).await?;
        Ok(Value::String(markdown))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for tools (built-in and custom Rust).
///
/// Use [`ToolRegistry::with_builtins`] to create a registry pre-loaded
/// with the core `search` and `get_content` tools, then optionally call
/// [`register`](ToolRegistry::register) to add custom ones.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a tool registry pre-loaded with the built-in tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchTool));
        registry.register(Box::new(GetContentTool));
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    /// Get all registered tools.
    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    /// Consume the registry, yielding its tools.
    pub fn into_tools(self) -> Vec<Box<dyn Tool>> {
        self.tools
    }

    /// Find a tool by name.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Return the count of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_registry_contents() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert!(registry.find("search").is_some());
        assert!(registry.find("get_content").is_some());
        assert!(registry.find("sync").is_none());
    }

    #[test]
    fn test_search_schema_requires_query() {
        let schema = SearchTool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"][0], "query");
        assert!(schema["properties"]["limit"].is_object());
    }

    #[test]
    fn test_get_content_schema_has_no_required_params() {
        let schema = GetContentTool.parameters_schema();
        assert_eq!(schema["required"].as_array().map(Vec::len), Some(0));
        assert!(schema["properties"]["id"].is_object());
        assert!(schema["properties"]["href"].is_object());
    }

    #[test]
    fn test_optional_str_treats_empty_as_absent() {
        let params = json!({ "id": "", "href": "/engineering/handbook" });
        assert_eq!(optional_str(&params, "id"), None);
        assert_eq!(optional_str(&params, "href"), Some("/engineering/handbook"));
        assert_eq!(optional_str(&params, "missing"), None);
    }
}
