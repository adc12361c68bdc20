//! 🗄️ The reducer's sink: every record becomes an upsert against the attribute store.
//!
//! The domain is ensured once, up front, and a failure there ends the run before
//! any input is read. After that each record gets its own retry budget. A record
//! that exhausts it is abandoned, reported back as [`Delivery::Abandoned`], and
//! the run moves on to the next line.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use super::sink::{Delivery, Sink};
use crate::records::OutputRecord;
use crate::retry::{RetryPolicy, WriteOutcome, write_with_backoff};
use crate::store::{AttributeSet, AttributeStore};

/// 🧩 How a projected `(key, value)` maps onto an item and its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemLayout {
    /// `(id, count)` → item `id`, `{Count: count, Name: placeholder}`
    CountWithPlaceholder { placeholder: String },
    /// `(name, id)` → item `id`, `{Name: name}`
    NameById,
}

impl ItemLayout {
    pub fn item(&self, record: OutputRecord) -> (String, AttributeSet) {
        match self {
            ItemLayout::CountWithPlaceholder { placeholder } => (
                record.key,
                AttributeSet::new()
                    .replace("Count", record.value)
                    .replace("Name", placeholder.as_str()),
            ),
            ItemLayout::NameById => (record.value, AttributeSet::new().replace("Name", record.key)),
        }
    }
}

#[derive(Debug)]
pub struct AttributeStoreSink<S> {
    store: S,
    domain: String,
    layout: ItemLayout,
    policy: RetryPolicy,
    written: u64,
    abandoned: u64,
}

impl<S: AttributeStore> AttributeStoreSink<S> {
    /// 🚀 Ensure the domain exists, then stand ready. No retries here: if the store
    /// will not even give us a domain, there is nothing to retry towards.
    pub async fn new(
        store: S,
        domain: impl Into<String>,
        layout: ItemLayout,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let domain = domain.into();
        store
            .ensure_domain(&domain)
            .await
            .with_context(|| format!("💀 The attribute store would not give us the domain '{domain}'"))?;
        Ok(Self {
            store,
            domain,
            layout,
            policy,
            written: 0,
            abandoned: 0,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: AttributeStore> Sink for AttributeStoreSink<S> {
    async fn send(&mut self, record: OutputRecord) -> Result<Delivery> {
        let (item, attributes) = self.layout.item(record);
        let store = &self.store;
        let domain = self.domain.as_str();
        let item_ref = item.as_str();
        let attributes_ref = &attributes;

        let outcome = write_with_backoff(&self.policy, move || {
            store.put_attributes(domain, item_ref, attributes_ref)
        })
        .await;

        Ok(match outcome {
            WriteOutcome::Done { attempts } => {
                self.written += 1;
                debug!("✅ item {item} written after {attempts} attempt(s)");
                Delivery::Delivered
            }
            WriteOutcome::Abandoned {
                attempts,
                last_error,
            } => {
                self.abandoned += 1;
                Delivery::Abandoned {
                    item,
                    attempts,
                    last_error,
                }
            }
        })
    }

    async fn close(&mut self) -> Result<()> {
        info!(
            "🗄️ domain '{}': {} items written, {} abandoned",
            self.domain, self.written, self.abandoned
        );
        Ok(())
    }
}
