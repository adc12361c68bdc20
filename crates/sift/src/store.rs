//! 🗄️ The remote attribute store: domains of items, items of named attributes.
//!
//! The store is an opaque, eventually-consistent key/value service. We need exactly
//! two things from it: make sure a domain exists, and upsert attributes on an item.
//! Attributes carry a `replace` flag. With `replace` the new value overwrites every
//! old value of that name, which is what makes re-running a reducer harmless.

pub mod http;
pub mod in_mem;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::{HttpAttributeStore, HttpStoreConfig};
pub use in_mem::InMemoryAttributeStore;

use crate::credentials::CredentialsProvider;

/// 🏷️ One `name = value` pair, and whether it replaces what was there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
    pub replace: bool,
}

/// 📦 Everything written to one item in one call. Serializes as `{"attributes":[...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeSet {
    pub attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// ➕ Add a replacing attribute. The only kind this pipeline writes.
    pub fn replace(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
            replace: true,
        });
        self
    }

    /// ➕ Add an appending attribute. Here for completeness of the store's model.
    pub fn append(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
            replace: false,
        });
        self
    }
}

/// 🗄️ The two operations the reducer needs. Any error is retryable as far as we know.
#[async_trait]
pub trait AttributeStore: std::fmt::Debug + Send + Sync {
    async fn ensure_domain(&self, domain: &str) -> Result<()>;
    async fn put_attributes(&self, domain: &str, item: &str, attributes: &AttributeSet)
    -> Result<()>;
}

/// 🔧 Which store to talk to. Externally tagged, like every other backend config.
#[derive(Debug, Deserialize, Clone)]
pub enum StoreBackendConfig {
    #[serde(alias = "http")]
    Http(HttpStoreConfig),
    #[serde(alias = "in_memory", alias = "inmemory")]
    InMemory,
}

/// 🎭 The many faces of the store.
#[derive(Debug)]
pub enum StoreBackend {
    Http(HttpAttributeStore),
    InMemory(InMemoryAttributeStore),
}

impl StoreBackend {
    /// 🚀 Build the store from config. Credentials are resolved here, once, at startup.
    pub fn from_config(config: &StoreBackendConfig) -> Result<Self> {
        Ok(match config {
            StoreBackendConfig::Http(http_config) => {
                let credentials = http_config.credentials.credentials()?;
                StoreBackend::Http(HttpAttributeStore::new(http_config, credentials)?)
            }
            StoreBackendConfig::InMemory => StoreBackend::InMemory(InMemoryAttributeStore::new()),
        })
    }
}

#[async_trait]
impl AttributeStore for StoreBackend {
    async fn ensure_domain(&self, domain: &str) -> Result<()> {
        match self {
            StoreBackend::Http(store) => store.ensure_domain(domain).await,
            StoreBackend::InMemory(store) => store.ensure_domain(domain).await,
        }
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &AttributeSet,
    ) -> Result<()> {
        match self {
            StoreBackend::Http(store) => store.put_attributes(domain, item, attributes).await,
            StoreBackend::InMemory(store) => store.put_attributes(domain, item, attributes).await,
        }
    }
}
