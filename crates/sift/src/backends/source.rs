use std::io::Cursor;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{self, BufReader, Stdin};

use super::stream::{ReadMode, StreamSource};
use crate::app_config::InputConfig;

/// 🚰 A source that produces one raw page per call, content uninterpreted.
///
/// # Contract 📜
/// - `Some(page)` while data flows; `None` once the stream is exhausted, and forever after.
/// - A page is one line (terminator stripped) or, in whole mode, everything.
/// - The source never parses. It's a faucet, not a chef.
#[async_trait]
pub trait Source: std::fmt::Debug {
    async fn next_page(&mut self) -> Result<Option<String>>;
}

/// 🎭 The many faces of a Source. Callers never need to know where the bytes come from.
#[derive(Debug)]
pub enum SourceBackend {
    Stdin(StreamSource<BufReader<Stdin>>),
    File(StreamSource<BufReader<File>>),
    InMemory(StreamSource<Cursor<Vec<u8>>>),
}

impl SourceBackend {
    /// 🚀 Open whatever the config points at. A missing input file is fatal, and loud.
    pub async fn from_config(input: &InputConfig, mode: ReadMode) -> Result<Self> {
        Ok(match input {
            InputConfig::Stdin => {
                SourceBackend::Stdin(StreamSource::new(BufReader::new(io::stdin()), mode, "stdin"))
            }
            InputConfig::File(file_config) => {
                SourceBackend::File(StreamSource::open(&file_config.file_name, mode).await?)
            }
        })
    }

    /// 🧪 A source backed by a string. For tests, and for anyone who already has the bytes.
    pub fn in_memory(text: impl Into<String>, mode: ReadMode) -> Self {
        SourceBackend::InMemory(StreamSource::new(
            Cursor::new(text.into().into_bytes()),
            mode,
            "memory",
        ))
    }
}

#[async_trait]
impl Source for SourceBackend {
    async fn next_page(&mut self) -> Result<Option<String>> {
        match self {
            SourceBackend::Stdin(s) => s.next_page().await,
            SourceBackend::File(f) => f.next_page().await,
            SourceBackend::InMemory(i) => i.next_page().await,
        }
    }
}
