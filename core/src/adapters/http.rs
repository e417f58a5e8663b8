//! HTTP service source backed by reqwest.

use std::time::Duration;

use reqwest::{Client, Url};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ports::{ListQuery, ServiceSource};

/// Reads service data from the dashboard backend over HTTP.
///
/// `GET {base}` returns the listing, `GET {base}{port}` a single service.
#[derive(Debug, Clone)]
pub struct HttpServiceSource {
    client: Client,
    base: Url,
}

impl HttpServiceSource {
    /// Create a source for `endpoint` with a per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base: Self::parse_base(endpoint)?,
        })
    }

    /// Parse the endpoint, forcing a trailing slash so ports join as a child path.
    fn parse_base(endpoint: &str) -> Result<Url> {
        let mut base = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("Invalid endpoint '{}': {}", endpoint, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    /// The normalized listing URL.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the detail resource for `port`.
    pub fn detail_url(&self, port: u16) -> Result<Url> {
        self.base
            .join(&port.to_string())
            .map_err(|e| Error::Config(format!("Invalid detail URL for port {}: {}", port, e)))
    }

    async fn get_json(&self, url: Url, query: Option<&ListQuery>) -> Result<Value> {
        let mut request = self.client.get(url.clone());
        if let Some(query) = query {
            request = request.query(&query.to_params());
        }

        debug!(%url, ?query, "Fetching services");
        let response = request.send().await?.error_for_status()?;
        let body = response.json::<Value>().await?;
        debug!(%url, "Fetched services payload");
        Ok(body)
    }
}

impl ServiceSource for HttpServiceSource {
    async fn fetch_list(&self, query: Option<&ListQuery>) -> Result<Value> {
        self.get_json(self.base.clone(), query).await
    }

    async fn fetch_one(&self, port: u16) -> Result<Value> {
        let url = self.detail_url(port)?;
        self.get_json(url, None).await
    }
}
