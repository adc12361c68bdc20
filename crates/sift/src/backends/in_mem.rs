use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::sink::{Delivery, Sink};
use crate::records::OutputRecord;

/// 📦 A sink that never forgets. Hoards every emitted line in a shared Vec.
///
/// Clone-able because tests hand one copy to the pipeline and keep the other to
/// peek inside afterwards. The `Arc` means everyone shares the same Vec.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    pub received: Arc<Mutex<Vec<String>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 🔍 Everything sent so far, as the `key \t value` lines a stream sink would have written.
    pub async fn lines(&self) -> Vec<String> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn send(&mut self, record: OutputRecord) -> Result<Delivery> {
        self.received.lock().await.push(record.to_line());
        Ok(Delivery::Delivered)
    }

    async fn close(&mut self) -> Result<()> {
        // -- 🗑️ nothing to flush, we live in RAM
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_one_where_the_clone_sees_what_the_original_received() -> Result<()> {
        let peeker = InMemorySink::new();
        let mut sink = peeker.clone();
        assert_eq!(sink.send(OutputRecord::new("k", "v")).await?, Delivery::Delivered);
        sink.close().await?;
        assert_eq!(peeker.lines().await, vec!["k\tv"]);
        Ok(())
    }
}
