//! Backend connectivity reporting for the `status` CLI command.

use anyhow::Result;
use serde::Serialize;

use crate::client::IglooClient;
use crate::config::{Config, IglooCredentials};

/// Connectivity report for the configured community.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub endpoint: String,
    pub community_key: String,
    pub credentials_present: bool,
    pub session_ok: bool,
    pub detail: Option<String>,
}

/// Probe the backend: are credentials present, and can a session be
/// established?
pub async fn get_status(config: &Config) -> BackendStatus {
    let endpoint = config.backend.endpoint.to_string();
    let community_key = config.backend.community_key.clone();

    let credentials = match IglooCredentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            return BackendStatus {
                endpoint,
                community_key,
                credentials_present: false,
                session_ok: false,
                detail: Some(e.to_string()),
            }
        }
    };

    match IglooClient::connect(&config.backend, &credentials).await {
        Ok(_) => BackendStatus {
            endpoint,
            community_key,
            credentials_present: true,
            session_ok: true,
            detail: None,
        },
        Err(e) => BackendStatus {
            endpoint,
            community_key,
            credentials_present: true,
            session_ok: false,
            detail: Some(e.to_string()),
        },
    }
}

/// CLI entry point — prints the report to stdout.
pub async fn run_status(config: &Config) -> Result<()> {
    let status = get_status(config).await;

    println!("endpoint:     {}", status.endpoint);
    println!("community:    {}", status.community_key);
    println!(
        "credentials:  {}",
        if status.credentials_present {
            "present"
        } else {
            "MISSING"
        }
    );
    println!(
        "session:      {}",
        if status.session_ok { "OK" } else { "UNAVAILABLE" }
    );
    if let Some(ref detail) = status.detail {
        println!("detail:       {}", detail);
    }

    Ok(())
}
