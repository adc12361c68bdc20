//! 🩺 The error channel: one line per complaint about the data.
//!
//! Not to be confused with logging. Logs are for operators and are filtered by level.
//! Diagnostics are part of the output contract: a malformed document produces exactly
//! one line here, always, whatever `RUST_LOG` says.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{self, AsyncWriteExt};
use tokio::sync::Mutex;

#[derive(Debug)]
pub enum DiagnosticsChannel {
    Stderr(io::Stderr),
    InMemory(Arc<Mutex<Vec<String>>>),
}

impl DiagnosticsChannel {
    pub fn stderr() -> Self {
        DiagnosticsChannel::Stderr(io::stderr())
    }

    /// 🧪 A channel plus a handle to read back what was reported.
    pub fn in_memory() -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        (DiagnosticsChannel::InMemory(Arc::clone(&lines)), lines)
    }

    /// 📣 Report one diagnostic. Embedded line breaks are flattened so it stays one line.
    pub async fn report(&mut self, diagnostic: &str) -> Result<()> {
        let line = diagnostic.replace(['\r', '\n'], " ");
        match self {
            DiagnosticsChannel::Stderr(stderr) => {
                stderr
                    .write_all(format!("{line}\n").as_bytes())
                    .await
                    .context("💀 Could not even complain. Stderr is gone.")?;
                stderr.flush().await.context("💀 Stderr refused to flush")?;
            }
            DiagnosticsChannel::InMemory(lines) => lines.lock().await.push(line),
        }
        Ok(())
    }
}
