//! HTTP bucket gateway client.
//!
//! Objects live at `{base}/{key}`:
//! - `GET` fetches, `404` means absent
//! - `PUT` creates or replaces
//! - `HEAD` checks existence
//! - `GET {base}/?prefix=<prefix>` lists, answering `{"keys": [...]}`

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::StorageError;
use super::object_store::{ObjectStore, shallow_children};

#[derive(Debug, Deserialize)]
struct ListResponse {
  keys: Vec<String>,
}

/// Object store reached over HTTP(S).
#[derive(Clone)]
pub struct HttpObjectStore {
  client: Client,
  base: String,
  token: Option<String>,
}

impl fmt::Debug for HttpObjectStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HttpObjectStore")
      .field("base", &self.base)
      .field("authenticated", &self.token.is_some())
      .finish()
  }
}

impl HttpObjectStore {
  /// Create a client for `base`. The timeout applies to every request.
  pub fn new(base: &str, token: Option<&str>, timeout: Duration) -> Result<Self, StorageError> {
    let client = Client::builder()
      .timeout(timeout)
      .user_agent(concat!("abivault/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| StorageError::remote("connect", base, e))?;

    Ok(Self {
      client,
      base: base.trim_end_matches('/').to_string(),
      token: token.map(str::to_string),
    })
  }

  fn url(&self, key: &str) -> String {
    format!("{}/{}", self.base, key.trim_start_matches('/'))
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
  fn location(&self) -> String {
    self.base.clone()
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
    let response = self
      .authorize(self.client.get(self.url(key)))
      .send()
      .await
      .map_err(|e| StorageError::remote("get", key, e))?;

    match response.status() {
      StatusCode::NOT_FOUND => Ok(None),
      status if status.is_success() => {
        let bytes = response.bytes().await.map_err(|e| StorageError::remote("get", key, e))?;
        debug!(key, bytes = bytes.len(), "fetched object");
        Ok(Some(bytes.to_vec()))
      }
      status => Err(StorageError::remote("get", key, format!("HTTP {}", status))),
    }
  }

  async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
    let response = self
      .authorize(self.client.put(self.url(key)))
      .header(reqwest::header::CONTENT_TYPE, "application/json")
      .body(content.to_vec())
      .send()
      .await
      .map_err(|e| StorageError::remote("put", key, e))?;

    if !response.status().is_success() {
      return Err(StorageError::remote("put", key, format!("HTTP {}", response.status())));
    }
    Ok(())
  }

  async fn exists(&self, key: &str) -> Result<bool, StorageError> {
    let response = self
      .authorize(self.client.head(self.url(key)))
      .send()
      .await
      .map_err(|e| StorageError::remote("head", key, e))?;

    match response.status() {
      StatusCode::NOT_FOUND => Ok(false),
      status if status.is_success() => Ok(true),
      status => Err(StorageError::remote("head", key, format!("HTTP {}", status))),
    }
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
    let response = self
      .authorize(self.client.get(format!("{}/", self.base)))
      .query(&[("prefix", prefix)])
      .send()
      .await
      .map_err(|e| StorageError::remote("list", prefix, e))?;

    if !response.status().is_success() {
      return Err(StorageError::remote("list", prefix, format!("HTTP {}", response.status())));
    }

    let listing: ListResponse = response
      .json()
      .await
      .map_err(|e| StorageError::remote("list", prefix, e))?;
    Ok(shallow_children(prefix, listing.keys))
  }
}
