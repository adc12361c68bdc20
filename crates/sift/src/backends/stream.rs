//! 🌊 Byte streams in, byte streams out.
//!
//! [`StreamSource`] is the Line Reader: any `AsyncBufRead` becomes a sequence of pages.
//! [`LineSink`] is the mapper side of the Sink Writer: any `AsyncWrite` receives
//! `key \t value` lines. Stdin, stdout, files and test buffers are all just type
//! parameters here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace, warn};

use super::sink::{Delivery, Sink};
use super::source::Source;
use crate::records::OutputRecord;

/// 📖 How much of the stream makes a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// one line per page, `\n` / `\r\n` stripped, empty lines kept
    Lines,
    /// the entire stream as a single page
    Whole,
}

/// 📂 The Line Reader. Wraps a buffered reader and hands out pages until EOF.
pub struct StreamSource<R> {
    reader: R,
    mode: ReadMode,
    label: String,
    exhausted: bool,
    pages_read: u64,
}

// -- the reader itself is excluded, stdin has nothing interesting to say about itself
impl<R> std::fmt::Debug for StreamSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("label", &self.label)
            .field("mode", &self.mode)
            .field("exhausted", &self.exhausted)
            .field("pages_read", &self.pages_read)
            .finish()
    }
}

impl<R> StreamSource<R> {
    pub fn new(reader: R, mode: ReadMode, label: impl Into<String>) -> Self {
        Self {
            reader,
            mode,
            label: label.into(),
            exhausted: false,
            pages_read: 0,
        }
    }
}

impl StreamSource<io::BufReader<File>> {
    /// 🚀 Open a file for reading. If it isn't there, anyhow will say so with feeling.
    pub async fn open(file_name: &str, mode: ReadMode) -> Result<Self> {
        let file_handle = File::open(file_name).await.context(format!(
            "💀 The input file '{file_name}' would not open. We knocked. \
             It might not exist. It might not like us. Either way, there is no input."
        ))?;
        Ok(Self::new(io::BufReader::new(file_handle), mode, file_name))
    }
}

impl<R> StreamSource<R> {
    /// 🔤 Bytes → text. Invalid UTF-8 is replaced with U+FFFD, never fatal: one
    /// Latin-1 byte in a partition must not cost us every line after it.
    fn decode(&self, bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap_or_else(|err| {
            warn!(
                "🔤 page {} of {} is not valid UTF-8, replacing the bad bytes",
                self.pages_read + 1,
                self.label
            );
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        })
    }
}

impl<R: AsyncBufRead + Unpin + Send> StreamSource<R> {
    async fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let bytes_read = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .with_context(|| format!("💀 Reading a line from {} went sideways", self.label))?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Ok(Some(self.decode(line)))
    }

    async fn whole_stream(&mut self) -> Result<Option<String>> {
        let mut buffer = Vec::new();
        self.reader
            .read_to_end(&mut buffer)
            .await
            .with_context(|| format!("💀 Slurping all of {} went sideways", self.label))?;
        // -- one page, then nothing, whatever happens next
        self.exhausted = true;
        debug!("📖 slurped {} bytes from {}", buffer.len(), self.label);
        if buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.decode(buffer)))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Source for StreamSource<R> {
    async fn next_page(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        let page = match self.mode {
            ReadMode::Lines => self.next_line().await?,
            ReadMode::Whole => self.whole_stream().await?,
        };
        match &page {
            Some(_) => self.pages_read += 1,
            None => {
                self.exhausted = true;
                debug!("🏁 {} ran dry after {} pages", self.label, self.pages_read);
            }
        }
        Ok(page)
    }
}

/// 🖨️ Writes each record as one `key \t value` line. Stdout or a file, it does not care.
///
/// Buffered, but every record is handed to the writer as it arrives, and `close`
/// flushes. A failed write is fatal: a mapper that cannot emit has no reason to live.
pub struct LineSink<W: AsyncWrite> {
    writer: io::BufWriter<W>,
    label: String,
    lines_written: u64,
}

impl<W: AsyncWrite> std::fmt::Debug for LineSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSink")
            .field("label", &self.label)
            .field("lines_written", &self.lines_written)
            .finish()
    }
}

impl<W: AsyncWrite> LineSink<W> {
    pub fn new(writer: W, label: impl Into<String>) -> Self {
        Self {
            writer: io::BufWriter::new(writer),
            label: label.into(),
            lines_written: 0,
        }
    }
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "stdout")
    }
}

impl LineSink<File> {
    /// 🚀 Create (and truncate) the output file. It doesn't knock first.
    pub async fn create(file_name: &str) -> Result<Self> {
        let file_handle = File::create(file_name).await.context(format!(
            "💀 The output file '{file_name}' could not be conjured into existence. \
             Perhaps the parent directory is imaginary."
        ))?;
        Ok(Self::new(file_handle, file_name))
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sink for LineSink<W> {
    async fn send(&mut self, record: OutputRecord) -> Result<Delivery> {
        let mut line = record.to_line();
        line.push('\n');
        trace!("📬 {} bytes walked into {}", line.len(), self.label);
        self.writer
            .write_all(line.as_bytes())
            .await
            .with_context(|| format!("💀 Writing to {} failed. The mapper cannot go on.", self.label))?;
        self.lines_written += 1;
        Ok(Delivery::Delivered)
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.flush().await.with_context(|| {
            format!(
                "💀 Flushing {} failed. The last lines were so close to making it.",
                self.label
            )
        })?;
        debug!("🎬 {} closed after {} lines", self.label, self.lines_written);
        Ok(())
    }
}
