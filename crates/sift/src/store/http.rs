//! 📡 The attribute store over HTTP.
//!
//! ```text
//!   PUT {endpoint}/domains/{domain}                 ensure the domain exists
//!   PUT {endpoint}/domains/{domain}/items/{item}    {"attributes":[{name,value,replace}]}
//! ```
//!
//! Basic auth with the access key and secret. Any non-2xx status is an error,
//! and the retry loop upstream decides what to do about it.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{AttributeSet, AttributeStore};
use crate::credentials::{Credentials, CredentialsConfig};

// -- 📡 config lives next to the backend that reads it
#[derive(Debug, Deserialize, Clone)]
pub struct HttpStoreConfig {
    pub endpoint: String,
    pub credentials: CredentialsConfig,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug)]
pub struct HttpAttributeStore {
    client: reqwest::Client,
    endpoint: Url,
    credentials: Credentials,
}

impl HttpAttributeStore {
    /// 🚀 Build the client. Nothing goes over the wire until `ensure_domain`.
    pub fn new(config: &HttpStoreConfig, credentials: Credentials) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).with_context(|| {
            format!(
                "💀 '{}' is not a URL the attribute store could live at",
                config.endpoint
            )
        })?;
        if endpoint.cannot_be_a_base() {
            bail!(
                "💀 '{}' cannot have paths appended to it, so it cannot be a store endpoint",
                config.endpoint
            );
        }
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("💀 The HTTP client refused to be born. Probably TLS. It's always TLS.")?;
        Ok(Self {
            client,
            endpoint,
            credentials,
        })
    }

    /// 🧭 `{endpoint}/seg/seg/...`, each segment percent-encoded. `/guid/...` ids stay one segment.
    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("💀 '{}' cannot be a base URL", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn put(&self, url: Url, body: String) -> Result<()> {
        trace!("📡 PUT {url} ({} bytes)", body.len());
        let response = self
            .client
            .put(url.clone())
            .basic_auth(&self.credentials.access_key, Some(self.credentials.secret_key()))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .with_context(|| format!("💀 PUT {url} never got an answer"))?;

        let status = response.status();
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            bail!("💀 PUT {url} came back {status}: {reason}");
        }
        Ok(())
    }
}

#[async_trait]
impl AttributeStore for HttpAttributeStore {
    async fn ensure_domain(&self, domain: &str) -> Result<()> {
        let url = self.url_for(&["domains", domain])?;
        self.put(url, "{}".to_string())
            .await
            .with_context(|| format!("💀 Could not make sure the domain '{domain}' exists"))?;
        debug!("✅ domain '{domain}' is open for business");
        Ok(())
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &AttributeSet,
    ) -> Result<()> {
        let url = self.url_for(&["domains", domain, "items", item])?;
        let body = serde_json::to_string(attributes)
            .context("💀 The attribute set refused to become JSON")?;
        self.put(url, body).await
    }
}
