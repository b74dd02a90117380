//! JSON-over-HTTP document store client.
//!
//! Routes, relative to the configured base URL:
//! - `GET    /{collection}`       → `{"documents": [{"id": .., "fields": {..}}]}`
//! - `GET    /{collection}/{id}`  → `{"id": .., "fields": {..}}` or 404
//! - `POST   /{collection}`       → body is the fields, response `{"id": ..}`
//! - `PUT    /{collection}/{id}`  → body is the fields
//! - `DELETE /{collection}/{id}`  → 2xx, or 404 when absent

use std::fmt;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{DeleteOutcome, DocumentStore, StoreCapabilities, StoredDocument};
use crate::util::{compact_text, is_http_url, normalize_text_option, trim_base_url};
use crate::{Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for [`RestDocumentStore`].
#[derive(Clone, PartialEq, Eq)]
pub struct RestConfig {
    /// Base URL of the document API.
    pub base_url: String,
    /// Bearer token issued upstream, passed through untouched.
    pub bearer_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = normalize_text_option(token);
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for RestConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RestConfig")
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Document store reached over HTTP.
#[derive(Clone)]
pub struct RestDocumentStore {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::Client,
}

impl fmt::Debug for RestDocumentStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RestDocumentStore")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<StoredDocument>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

impl RestDocumentStore {
    pub fn new(config: RestConfig) -> Result<Self> {
        let base_url = trim_base_url(&config.base_url);
        if !is_http_url(&base_url) {
            return Err(Error::validation(
                "Store URL must start with http:// or https://",
            ));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url,
            bearer_token: config.bearer_token,
            client,
        })
    }

    /// Returns the normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(collection))
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|error| Error::store(format!("{operation} request failed: {error}")))
    }
}

async fn failure(operation: &str, response: Response) -> Error {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Error::store(format!(
        "{operation} failed with HTTP {status}: {}",
        compact_text(&body)
    ))
}

fn validate_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::validation("Document id cannot be empty"));
    }
    Ok(id)
}

impl DocumentStore for RestDocumentStore {
    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { point_reads: true }
    }

    async fn list(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let request = self.client.get(self.collection_url(collection));
        let response = self.send("List", request).await?;
        if !response.status().is_success() {
            return Err(failure("List", response).await);
        }

        let payload = response
            .json::<ListResponse>()
            .await
            .map_err(|error| Error::store(format!("Failed to parse list response: {error}")))?;
        Ok(payload.documents)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let id = validate_id(id)?;
        let request = self.client.get(self.document_url(collection, id));
        let response = self.send("Get", request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(failure("Get", response).await);
        }

        let document = response
            .json::<StoredDocument>()
            .await
            .map_err(|error| Error::store(format!("Failed to parse document: {error}")))?;
        Ok(Some(document))
    }

    async fn upsert(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: Map<String, Value>,
    ) -> Result<String> {
        let body = Value::Object(fields);
        if let Some(id) = id {
            let id = validate_id(id)?;
            let request = self.client.put(self.document_url(collection, id)).json(&body);
            let response = self.send("Update", request).await?;
            if !response.status().is_success() {
                return Err(failure("Update", response).await);
            }
            return Ok(id.to_string());
        }

        let request = self.client.post(self.collection_url(collection)).json(&body);
        let response = self.send("Create", request).await?;
        if !response.status().is_success() {
            return Err(failure("Create", response).await);
        }
        let created = response
            .json::<CreateResponse>()
            .await
            .map_err(|error| Error::store(format!("Failed to parse create response: {error}")))?;
        if created.id.trim().is_empty() {
            return Err(Error::store("Store returned an empty document id"));
        }
        Ok(created.id)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let id = validate_id(id)?;
        let request = self.client.delete(self.document_url(collection, id));
        let response = self.send("Delete", request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(DeleteOutcome::NotFound);
        }
        if !response.status().is_success() {
            return Err(failure("Delete", response).await);
        }
        Ok(DeleteOutcome::Deleted)
    }
}
