use anyhow::Result;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::Stdout;

use super::attribute_store::AttributeStoreSink;
use super::in_mem::InMemorySink;
use super::stream::LineSink;
use crate::records::OutputRecord;
use crate::store::StoreBackend;

/// 📬 What became of one record.
///
/// Stream sinks only ever deliver (or fail the whole run). The attribute store
/// can give up on a single record and let the run carry on, and the pipeline
/// needs to know who got left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Abandoned {
        item: String,
        attempts: u32,
        last_error: String,
    },
}

/// 🕳️ A sink that takes projected records, one at a time. I/O only, zero logic.
///
/// # Contract 📜
/// - `send` writes or persists one record. `Err` is fatal to the run.
/// - `close` flushes and finalizes. MUST be called. Skipping it is a bug, and rude.
#[async_trait]
pub trait Sink: std::fmt::Debug {
    async fn send(&mut self, record: OutputRecord) -> Result<Delivery>;
    async fn close(&mut self) -> Result<()>;
}

/// 🎭 The many faces of a Sink, mirroring [`super::SourceBackend`] on the other end.
#[derive(Debug)]
pub enum SinkBackend {
    Stdout(LineSink<Stdout>),
    File(LineSink<File>),
    InMemory(InMemorySink),
    AttributeStore(AttributeStoreSink<StoreBackend>),
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&mut self, record: OutputRecord) -> Result<Delivery> {
        match self {
            SinkBackend::Stdout(sink) => sink.send(record).await,
            SinkBackend::File(sink) => sink.send(record).await,
            SinkBackend::InMemory(sink) => sink.send(record).await,
            SinkBackend::AttributeStore(sink) => sink.send(record).await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self {
            SinkBackend::Stdout(sink) => sink.close().await,
            SinkBackend::File(sink) => sink.close().await,
            SinkBackend::InMemory(sink) => sink.close().await,
            SinkBackend::AttributeStore(sink) => sink.close().await,
        }
    }
}
