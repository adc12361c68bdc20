//! 🔄 Transforms: extraction and projection, the two halves of "make sense of this line".
//!
//! ```text
//!   page ──▶ Extract ──▶ Vec<ExtractedEntity> ──▶ Project ──▶ OutputRecord
//!             │                                                  │
//!             └── diagnostics (one line each) ──▶ error channel  └──▶ Sink
//! ```
//!
//! Every extractor is a pure function over one page. No I/O, no clocks, no globals.
//! The [`ExtractorBackend`] enum picks one per role, same trait → concrete impls →
//! enum dispatcher pattern the backends use. 🦆

pub mod escape;
pub mod interactions;
pub mod projector;
pub mod tab_split;
pub mod tally;

use anyhow::Result;

use crate::app_config::MapperConfig;
use crate::records::{ExtractedEntity, OutputRecord};
use crate::roles::{MapRole, ReduceRole, Role};

pub use escape::EscapeMode;
pub use interactions::InteractionExtractor;
pub use projector::Projector;
pub use tab_split::{CountPassthrough, NameExtractor};
pub use tally::{GuidTally, WordTally};

/// 📋 What came out of one page: the entities worth keeping, and the complaints.
///
/// Silent skips produce neither. Diagnostics are single lines destined for the
/// error channel, never stdout.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Extraction {
    pub entities: Vec<ExtractedEntity>,
    pub diagnostics: Vec<String>,
}

impl Extraction {
    pub fn from_entity(entity: ExtractedEntity) -> Self {
        Self {
            entities: vec![entity],
            diagnostics: Vec::new(),
        }
    }

    pub fn from_diagnostic(diagnostic: String) -> Self {
        Self {
            entities: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// 📥 Raw page → typed entities. Must never fail the run: bad input is dropped or diagnosed.
pub trait Extract {
    fn extract(&self, page: &str) -> Extraction;
}

/// 📤 Typed entity → emitted `(key, value)`.
pub trait Project {
    fn project(&self, entity: ExtractedEntity) -> Result<OutputRecord>;
}

/// 🎭 The many faces of extraction, resolved from the role.
#[derive(Debug, Clone)]
pub enum ExtractorBackend {
    Names(NameExtractor),
    Counts(CountPassthrough),
    Interactions(InteractionExtractor),
    Guids(GuidTally),
    Words(WordTally),
}

impl ExtractorBackend {
    /// 🎯 Pick the extractor a role needs. Reducers read what their mapper wrote.
    pub fn from_role(role: Role, mapper_config: &MapperConfig) -> Result<Self> {
        Ok(match role {
            Role::Map(MapRole::Names) | Role::Reduce(ReduceRole::Names) => {
                ExtractorBackend::Names(NameExtractor::new(mapper_config.name_marker.clone()))
            }
            Role::Map(MapRole::Counts) | Role::Reduce(ReduceRole::Counts) => {
                ExtractorBackend::Counts(CountPassthrough)
            }
            Role::Map(MapRole::Interactions) => {
                ExtractorBackend::Interactions(InteractionExtractor)
            }
            Role::Map(MapRole::Guids) => {
                ExtractorBackend::Guids(GuidTally::new(mapper_config.guid_prefix.clone()))
            }
            Role::Map(MapRole::Words) => ExtractorBackend::Words(WordTally::new()?),
        })
    }
}

impl Extract for ExtractorBackend {
    fn extract(&self, page: &str) -> Extraction {
        match self {
            ExtractorBackend::Names(e) => e.extract(page),
            ExtractorBackend::Counts(e) => e.extract(page),
            ExtractorBackend::Interactions(e) => e.extract(page),
            ExtractorBackend::Guids(e) => e.extract(page),
            ExtractorBackend::Words(e) => e.extract(page),
        }
    }
}
