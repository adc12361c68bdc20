use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AttributeSet, AttributeStore};

/// attribute name → every value it currently holds
pub type Item = BTreeMap<String, Vec<String>>;

type Domains = BTreeMap<String, BTreeMap<String, Item>>;

/// 🧠 A store that lives in RAM and follows the real store's rules.
///
/// Attributes are multi-valued. `replace` wipes the old values first, anything else
/// appends. Writing to a domain that was never ensured is an error, same as the
/// real thing. Clone shares the same state, so a test can keep a handle.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAttributeStore {
    domains: Arc<Mutex<Domains>>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🔍 A snapshot of one item, if it exists.
    pub async fn item(&self, domain: &str, item: &str) -> Option<Item> {
        self.domains.lock().await.get(domain)?.get(item).cloned()
    }

    pub async fn item_count(&self, domain: &str) -> usize {
        self.domains
            .lock()
            .await
            .get(domain)
            .map_or(0, BTreeMap::len)
    }

    pub async fn has_domain(&self, domain: &str) -> bool {
        self.domains.lock().await.contains_key(domain)
    }
}

#[async_trait]
impl AttributeStore for InMemoryAttributeStore {
    async fn ensure_domain(&self, domain: &str) -> Result<()> {
        self.domains
            .lock()
            .await
            .entry(domain.to_string())
            .or_default();
        Ok(())
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: &AttributeSet,
    ) -> Result<()> {
        let mut domains = self.domains.lock().await;
        let Some(items) = domains.get_mut(domain) else {
            bail!("💀 The domain '{domain}' does not exist. Nobody ensured it. Nobody ever does.");
        };
        let stored = items.entry(item.to_string()).or_default();
        for attribute in &attributes.attributes {
            let values = stored.entry(attribute.name.clone()).or_default();
            if attribute.replace {
                values.clear();
            }
            values.push(attribute.value.clone());
        }
        Ok(())
    }
}
