//! ✂️ Tab-split extractors: one line in, zero or one entity out.
//!
//! Both variants want at least two fields. Anything shorter is skipped without a
//! peep: no output, no diagnostic, no hard feelings. Streaming jobs see a lot of
//! junk lines and complaining about each one would drown the logs.

use memchr::memmem;

use super::{Extract, Extraction};
use crate::records::{ExtractedEntity, RawRecord};

/// 🏷️ Variant A: `name \t id`, kept only when the id carries the marker.
///
/// The marker is a plain substring match (anywhere in the id), e.g. `/guid/`.
#[derive(Debug, Clone)]
pub struct NameExtractor {
    marker: String,
}

impl NameExtractor {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Extract for NameExtractor {
    fn extract(&self, page: &str) -> Extraction {
        let record = RawRecord::from_tab_line(page);
        if record.field_count() < 2 {
            return Extraction::default();
        }

        let (name, id) = (record.fields[0], record.fields[1]);
        // 🔍 memmem: a substring search that went to the gym
        if memmem::find(id.as_bytes(), self.marker.as_bytes()).is_none() {
            return Extraction::default();
        }

        Extraction::from_entity(ExtractedEntity::Named {
            name: name.to_string(),
            id: id.to_string(),
        })
    }
}

/// 🔢 Variant B: `id \t count`, accepted as soon as there are two fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountPassthrough;

impl Extract for CountPassthrough {
    fn extract(&self, page: &str) -> Extraction {
        match RawRecord::from_tab_line(page).fields.as_slice() {
            [id, count, ..] => {
                Extraction::from_entity(ExtractedEntity::Counted {
                    id: id.to_string(),
                    count: count.to_string(),
                })
            }
            _ => Extraction::default(),
        }
    }
}
