//! # Igloo MCP CLI (`igloo-mcp`)
//!
//! The `igloo-mcp` binary is the primary interface for Igloo MCP. It
//! provides commands for searching the community, retrieving pages as
//! Markdown, checking backend connectivity, and starting the MCP server.
//!
//! ## Usage
//!
//! ```bash
//! igloo-mcp --config ./config/igloo-mcp.toml <command>
//! ```
//!
//! Credentials are read from the environment: `IGLOO_USER`, `IGLOO_PASS`,
//! `IGLOO_API_KEY`, and `IGLOO_ACCESS_KEY`.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `igloo-mcp search "<query>"` | Search the community for matching pages |
//! | `igloo-mcp get --id <id>` | Retrieve a page by object ID |
//! | `igloo-mcp get --href <path>` | Retrieve a page by community path |
//! | `igloo-mcp status` | Check credentials and backend connectivity |
//! | `igloo-mcp serve mcp` | Start the REST + MCP HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Check that credentials and the backend are in order
//! igloo-mcp status --config ./config/igloo-mcp.toml
//!
//! # Search with a custom result limit
//! igloo-mcp search "vacation policy" --limit 3
//!
//! # Fetch a page by path, including its attachments
//! igloo-mcp get --href /engineering/handbook --attachments
//!
//! # Start the HTTP server for Cursor integration
//! igloo-mcp serve mcp --config ./config/igloo-mcp.toml
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use igloo_mcp::{config, get, search, server, status};

/// Igloo MCP CLI — search and content retrieval for an Igloo community.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/igloo-mcp.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "igloo-mcp",
    about = "Igloo MCP — expose Igloo community search and content retrieval as agent tools",
    version,
    long_about = "Igloo MCP wraps the Igloo intranet API behind two agent-facing tools: search \
    finds community pages matching a query, and get_content fetches a page by object ID or \
    community path and converts its HTML body to Markdown. Both are available via this CLI, \
    a plain JSON REST API, and a streamable MCP endpoint."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/igloo-mcp.toml`. Backend endpoint, community
    /// key, and server settings are read from this file.
    #[arg(long, global = true, default_value = "./config/igloo-mcp.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Search the community for matching pages.
    ///
    /// Prints ranked results with titles, URLs, and descriptions. The
    /// result count is capped client-side; the backend is not trusted
    /// to honor the limit.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return (defaults to `[search].default_limit`).
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Retrieve a page by object ID or community path.
    ///
    /// Prints the page's metadata and its body converted to Markdown.
    /// Exactly one of `--id` or `--href` is required; if both are given,
    /// `--id` wins.
    Get {
        /// Object ID of the page.
        #[arg(long)]
        id: Option<String>,

        /// Community-relative path (e.g., `/engineering/handbook`).
        #[arg(long)]
        href: Option<String>,

        /// Also fetch and list the page's attachments.
        #[arg(long)]
        attachments: bool,
    },

    /// Check credentials and backend connectivity.
    ///
    /// Verifies that all four credential environment variables are set
    /// and that a session can be established with the configured
    /// community. Useful before starting the server.
    Status,

    /// Start the REST + MCP HTTP server.
    ///
    /// Exposes the search and get_content tools via a JSON API and a
    /// streamable MCP endpoint for Cursor, Claude, and other MCP clients.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

/// Server subcommands.
#[derive(Subcommand)]
enum ServeService {
    /// Start the MCP tool server.
    ///
    /// Binds to the address configured in `[server].bind` and serves
    /// the tool endpoints plus `/mcp`.
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Search { query, limit } => {
            search::run_search(&cfg, &query, limit).await?;
        }
        Commands::Get {
            id,
            href,
            attachments,
        } => {
            get::run_get(&cfg, id.as_deref(), href.as_deref(), attachments).await?;
        }
        Commands::Status => {
            status::run_status(&cfg).await?;
        }
        Commands::Serve { service } => match service {
            ServeService::Mcp => {
                server::run_server(&cfg).await?;
            }
        },
    }

    Ok(())
}
