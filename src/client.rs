//! HTTP client for the Igloo community API.
//!
//! A session is established once at construction (`session/create` on the v1
//! API root) and the returned session key rides along on every request as an
//! `iglooauth` cookie. Object and search routes live under the v2 root,
//! scoped to the configured community key; document binaries and attachment
//! listings are still v1 routes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::config::{BackendConfig, IglooCredentials};
use crate::error::SourceError;
use crate::html;

const API_ROOT_V1: &str = "/.api/api.svc";
const API_ROOT_V2: &str = "/.api2/api/v1/communities";

/// Read access to community content, as consumed by normalization.
///
/// [`IglooClient`] is the production implementation; tests substitute stubs.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Base URL of the community, used to absolutize hrefs.
    fn endpoint(&self) -> &Url;

    /// Fetch an object record by id.
    async fn get_object(&self, object_id: &str) -> Result<Value, SourceError>;

    /// Raw bytes of a stored document.
    async fn get_document_binary(&self, document_id: &str) -> Result<Vec<u8>, SourceError>;

    /// Rendered widget HTML for a page, or `None` when the page has none.
    async fn get_widget_html_by_path(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError>;

    /// Raw attachment listing for an object.
    async fn attachments_view(&self, object_id: &str) -> Result<Value, SourceError>;
}

/// Authenticated client for one Igloo community.
pub struct IglooClient {
    http: reqwest::Client,
    endpoint: Url,
    community_key: String,
}

impl IglooClient {
    /// Authenticate against the community and return a ready client.
    pub async fn connect(
        config: &BackendConfig,
        credentials: &IglooCredentials,
    ) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let bootstrap = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::BackendUnavailable(e.to_string()))?;

        let session_url = join_path(&config.endpoint, &format!("{}/session/create", API_ROOT_V1))?;
        let response = bootstrap
            .get(session_url)
            .query(&[
                ("appId", credentials.access_key.as_str()),
                ("appPass", credentials.api_key.as_str()),
                ("apiVersion", "1"),
                ("community", config.endpoint.as_str()),
                ("username", credentials.user.as_str()),
                ("password", credentials.pass.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error("session/create", e))?;
        if !response.status().is_success() {
            return Err(SourceError::BackendError(format!(
                "session/create returned {}",
                response.status()
            )));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| transport_error("session/create", e))?;
        let session_key = body
            .pointer("/response/sessionKey")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SourceError::BackendError("session/create response has no sessionKey".to_string())
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let cookie = HeaderValue::from_str(&format!("iglooauth={}", session_key))
            .map_err(|e| SourceError::BackendError(format!("unusable session key: {}", e)))?;
        headers.insert(COOKIE, cookie);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::BackendUnavailable(e.to_string()))?;

        tracing::debug!(endpoint = %config.endpoint, "igloo session established");

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            community_key: config.community_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// GET `.../objects/{id}/view` on the v2 root.
    pub async fn get_object(&self, object_id: &str) -> Result<Value, SourceError> {
        let url = self.v2_url(&format!("/objects/{}/view", object_id))?;
        let response = self.send(url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("object {}", object_id)));
        }
        json_body(response).await
    }

    /// GET `.../objects/byPath` on the v2 root. A missing path is `None`,
    /// matching the backend's "null record" answer.
    pub async fn get_object_by_path(&self, path: &str) -> Result<Option<Value>, SourceError> {
        let url = self.v2_url("/objects/byPath")?;
        let response = self
            .http
            .get(url.clone())
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: Value = json_body(response).await?;
        if record.is_null() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// GET `documents/{id}/view_binary` on the v1 root.
    pub async fn get_document_binary(&self, document_id: &str) -> Result<Vec<u8>, SourceError> {
        let url = self.v1_url(&format!("/documents/{}/view_binary", document_id))?;
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "*/*")
            .send()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(format!("document {}", document_id)));
        }
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::BackendError(format!(
                "GET {} returned {}",
                url.path(),
                status
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        Ok(bytes.to_vec())
    }

    /// Fetch the rendered page at `path` and pull out its widget content.
    ///
    /// This is the degradation path for pages whose record carries no inline
    /// content: a non-success response or a widget-less page yields `None`
    /// rather than an error. Transport failures still propagate.
    pub async fn get_widget_html_by_path(
        &self,
        path: &str,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        let url = join_path(&self.endpoint, path)?;
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "text/html")
            .send()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        if !response.status().is_success() {
            return Ok(None);
        }
        let page_html = response
            .text()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        Ok(html::extract_widget_content(&page_html).map(String::into_bytes))
    }

    /// GET `objects/{id}/attachments/view` on the v1 root.
    pub async fn attachments_view(&self, object_id: &str) -> Result<Value, SourceError> {
        let url = self.v1_url(&format!("/objects/{}/attachments/view", object_id))?;
        let response = self.send(url).await?;
        json_body(response).await
    }

    /// GET `.../search/content/detailed` on the v2 root, yielding the raw
    /// `results` array (empty when absent).
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Value>, SourceError> {
        let url = self.v2_url("/search/content/detailed")?;
        let limit = limit.to_string();
        let response = self
            .http
            .get(url.clone())
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(url.path(), e))?;
        let body: Value = json_body(response).await?;
        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn v1_url(&self, rest: &str) -> Result<Url, SourceError> {
        join_path(&self.endpoint, &format!("{}{}", API_ROOT_V1, rest))
    }

    fn v2_url(&self, rest: &str) -> Result<Url, SourceError> {
        join_path(
            &self.endpoint,
            &format!("{}/{}{}", API_ROOT_V2, self.community_key, rest),
        )
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, SourceError> {
        tracing::debug!(path = url.path(), "igloo API request");
        self.http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(url.path(), e))
    }
}

#[async_trait]
impl ContentFetcher for IglooClient {
    fn endpoint(&self) -> &Url {
        IglooClient::endpoint(self)
    }

    async fn get_object(&self, object_id: &str) -> Result<Value, SourceError> {
        IglooClient::get_object(self, object_id).await
    }

    async fn get_document_binary(&self, document_id: &str) -> Result<Vec<u8>, SourceError> {
        IglooClient::get_document_binary(self, document_id).await
    }

    async fn get_widget_html_by_path(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        IglooClient::get_widget_html_by_path(self, path).await
    }

    async fn attachments_view(&self, object_id: &str) -> Result<Value, SourceError> {
        IglooClient::attachments_view(self, object_id).await
    }
}

/// Read a response body as JSON, turning non-success statuses into
/// `BackendError` first.
async fn json_body(response: reqwest::Response) -> Result<Value, SourceError> {
    let status = response.status();
    let path = response.url().path().to_string();
    if !status.is_success() {
        return Err(SourceError::BackendError(format!(
            "GET {} returned {}",
            path, status
        )));
    }
    response
        .json()
        .await
        .map_err(|e| transport_error(&path, e))
}

fn transport_error(what: &str, err: reqwest::Error) -> SourceError {
    if err.is_connect() || err.is_timeout() {
        SourceError::BackendUnavailable(format!("{}: {}", what, err))
    } else {
        SourceError::BackendError(format!("{}: {}", what, err))
    }
}

fn join_path(endpoint: &Url, path: &str) -> Result<Url, SourceError> {
    endpoint.join(path).map_err(|e| {
        SourceError::BackendError(format!("cannot resolve {} against {}: {}", path, endpoint, e))
    })
}
