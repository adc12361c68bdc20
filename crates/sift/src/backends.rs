//! 🔌 Backends: where the real I/O happens.
//!
//! 🚰 Sources pour pages in, sinks swallow records out. Everything in between is
//! pure and lives in [`crate::transforms`].
//!
//! Same shape all the way down: trait → concrete impls → enum dispatcher. The
//! pipeline only ever talks to [`SourceBackend`] and [`SinkBackend`], so it never
//! learns whether it is reading a pipe, a file, or a `Vec<u8>` a test made up. 🦆

pub mod attribute_store;
pub mod in_mem;
pub mod sink;
pub mod source;
pub mod stream;

pub use attribute_store::{AttributeStoreSink, ItemLayout};
pub use in_mem::InMemorySink;
pub use sink::{Delivery, Sink, SinkBackend};
pub use source::{Source, SourceBackend};
pub use stream::{LineSink, ReadMode, StreamSource};
