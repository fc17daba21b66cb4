//! # Igloo MCP
//!
//! An MCP tool server exposing Igloo community search and content
//! retrieval as Markdown.
//!
//! Igloo MCP wraps the Igloo intranet API behind two agent-facing tools:
//! `search` finds pages matching a query, and `get_content` fetches a
//! page by object ID or community path and converts its HTML body to
//! Markdown. Both are available via a CLI, a plain JSON REST API, and a
//! streamable MCP endpoint.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Igloo API  │──▶│    Client    │──▶│   Convert   │
//! │  (v1 + v2)  │   │ session+HTTP │   │ Page → MD   │
//! └─────────────┘   └──────────────┘   └─────┬───────┘
//!                                            │
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!                  ┌──────────┐        ┌──────────┐
//!                  │   CLI    │        │   HTTP   │
//!                  │(igloo-mcp)│       │ REST+MCP │
//!                  └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! igloo-mcp status                            # check credentials + session
//! igloo-mcp search "vacation policy"
//! igloo-mcp get --href /engineering/handbook
//! igloo-mcp serve mcp                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`models`] | Core data types (`Page`, `SearchResult`, attachments) |
//! | [`error`] | The `SourceError` taxonomy |
//! | [`client`] | Authenticated Igloo API client |
//! | [`html`] | HTML to Markdown rendering and widget extraction |
//! | [`convert`] | Record normalization (API object → `Page` → Markdown) |
//! | [`search`] | Community search and result mapping |
//! | [`get`] | Page retrieval by ID or path |
//! | [`status`] | Backend connectivity probe |
//! | [`tools`] | Tool trait, registry, and built-ins |
//! | [`server`] | REST + MCP HTTP server |
//! | [`mcp`] | MCP JSON-RPC protocol bridge |

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod get;
pub mod html;
pub mod mcp;
pub mod models;
pub mod search;
pub mod server;
pub mod status;
pub mod tools;
