//! Content retrieval by object id or community path.
//!
//! Resolves a record through the backend, normalizes it into a [`Page`] and
//! renders Markdown. Used by the `igloo-mcp get` CLI command, the
//! `POST /tools/get_content` HTTP endpoint, and the MCP `get_content` tool.

use anyhow::Result;
use serde_json::Value;

use crate::client::IglooClient;
use crate::config::{Config, IglooCredentials};
use crate::convert;
use crate::error::SourceError;
use crate::models::{Attachment, Page};

/// Resolve and normalize a page. `id` wins when both arguments are given;
/// `href` is never consulted in that case.
pub async fn fetch_page(
    config: &Config,
    id: Option<&str>,
    href: Option<&str>,
) -> Result<Page> {
    if id.is_none() && href.is_none() {
        return Err(SourceError::InvalidArgument(
            "either 'id' or 'href' must be provided".to_string(),
        )
        .into());
    }

    let credentials = IglooCredentials::from_env()?;
    let client = IglooClient::connect(&config.backend, &credentials).await?;

    let record = if let Some(object_id) = id {
        client.get_object(object_id).await?
    } else if let Some(path) = href {
        client
            .get_object_by_path(path)
            .await?
            .ok_or_else(|| SourceError::NotFound(format!("path {}", path)))?
    } else {
        // Guarded at entry.
        unreachable!()
    };

    let page = convert::page_from_object(&client, &record).await?;
    Ok(page)
}

/// Fetch a page and render its content as Markdown.
pub async fn fetch_page_markdown(
    config: &Config,
    id: Option<&str>,
    href: Option<&str>,
) -> Result<String> {
    let page = fetch_page(config, id, href).await?;
    Ok(convert::page_to_markdown(&page)?)
}

/// Resolve the attachments of an object.
pub async fn fetch_page_attachments(config: &Config, object_id: &str) -> Result<Vec<Attachment>> {
    let credentials = IglooCredentials::from_env()?;
    let client = IglooClient::connect(&config.backend, &credentials).await?;
    Ok(convert::attachments_for_page(&client, object_id).await?)
}

/// CLI entry point — fetches the page and prints it to stdout.
pub async fn run_get(
    config: &Config,
    id: Option<&str>,
    href: Option<&str>,
    with_attachments: bool,
) -> Result<()> {
    let page = match fetch_page(config, id, href).await {
        Ok(page) => page,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("--- Page ---");
    println!("id:          {}", page.page_id);
    println!("title:       {}", page.title);
    println!("url:         {}", page.url);
    println!("path:        {}", page.url_path);
    println!("extension:   {}", page.extension);
    println!("type:        {}", page.content_type);
    println!("published:   {}", page.is_published);
    println!("archived:    {}", page.is_archived);
    println!("scheduled:   {}", page.is_scheduled_for_archiving);
    if !page.statistics.is_empty() {
        println!("statistics:  {}", Value::Object(page.statistics.clone()));
    }
    println!();

    match convert::page_to_markdown(&page) {
        Ok(markdown) => {
            println!("--- Markdown ---");
            println!("{}", markdown);
        }
        Err(SourceError::UnsupportedFormat(extension)) => {
            println!("--- Content ---");
            println!(
                "(binary {} content, {} bytes, not rendered)",
                extension,
                page.content.len()
            );
        }
        Err(e) => return Err(e.into()),
    }

    if with_attachments {
        let attachments = match fetch_page_attachments(config, &page.page_id).await {
            Ok(attachments) => attachments,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };
        println!();
        println!("--- Attachments ({}) ---", attachments.len());
        for attachment in &attachments {
            println!("{} ({} bytes)", attachment.name, attachment.content.len());
        }
    }

    Ok(())
}
