//! Community search: wraps the backend's detailed content search and maps
//! raw hits into [`SearchResult`]s.

use anyhow::Result;
use serde_json::Value;
use url::Url;

use crate::client::IglooClient;
use crate::config::{Config, IglooCredentials};
use crate::convert::{map_field, required_str};
use crate::error::SourceError;
use crate::models::SearchResult;

/// Run a search against the community, returning at most `limit` results in
/// the backend's order.
pub async fn search_community(
    config: &Config,
    query: &str,
    limit: u32,
) -> Result<Vec<SearchResult>> {
    let credentials = IglooCredentials::from_env()?;
    let client = IglooClient::connect(&config.backend, &credentials).await?;
    let hits = client.search(query, limit).await?;
    Ok(map_search_hits(&hits, client.endpoint(), limit)?)
}

/// Map raw hits 1:1 into [`SearchResult`]s, preserving backend order.
///
/// The backend is not trusted to honor `limit`, so the cap is applied here
/// as well.
pub fn map_search_hits(
    hits: &[Value],
    endpoint: &Url,
    limit: u32,
) -> Result<Vec<SearchResult>, SourceError> {
    let mut results = Vec::new();
    for hit in hits.iter().take(limit as usize) {
        results.push(search_result_from_hit(hit, endpoint)?);
    }
    Ok(results)
}

/// Map one raw search hit into a [`SearchResult`].
pub fn search_result_from_hit(hit: &Value, endpoint: &Url) -> Result<SearchResult, SourceError> {
    let id = required_str(hit, "id")?.to_string();
    let title = required_str(hit, "title")?.to_string();
    let href = required_str(hit, "href")?;
    let url = endpoint.join(href).map_err(|e| {
        SourceError::BackendError(format!("search hit href {:?} does not resolve: {}", href, e))
    })?;

    Ok(SearchResult {
        id,
        title,
        url: url.to_string(),
        description: hit
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        keywords: map_field(hit, "keywords"),
        last_updated: hit
            .get("modifiedDate")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

pub async fn run_search(config: &Config, query: &str, limit: Option<u32>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let limit = limit.unwrap_or(config.search.default_limit);
    let results = match search_community(config, query, limit).await {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        println!("    url: {}", result.url);
        if let Some(ref updated) = result.last_updated {
            println!("    updated: {}", updated);
        }
        if let Some(ref description) = result.description {
            println!("    description: {}", description.replace('\n', " "));
        }
        println!("    id: {}", result.id);
        println!();
    }

    Ok(())
}
