//! ➕ Tally extractors: emit one `Tally` per interesting token, let the harness add them up.
//!
//! The harness's built-in aggregate reducer sums any key prefixed with
//! `LongValueSum:`, so these mappers never count anything themselves. They just
//! shout "one!" every time they see something. Like a toddler with a clicker. 🦆

use anyhow::{Context, Result};
use regex::Regex;

use super::{Extract, Extraction};
use crate::records::ExtractedEntity;

/// 🆔 Every whitespace-separated word, split again on commas, that starts with the prefix.
///
/// `/guid/1,/guid/2 /en/nope` tallies two guids and ignores the rest.
#[derive(Debug, Clone)]
pub struct GuidTally {
    prefix: String,
}

impl GuidTally {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Extract for GuidTally {
    fn extract(&self, page: &str) -> Extraction {
        let entities = page
            .split_whitespace()
            .flat_map(|word| word.split(','))
            .filter(|id| id.starts_with(self.prefix.as_str()))
            .map(|id| ExtractedEntity::Tally { key: id.to_string() })
            .collect();
        Extraction {
            entities,
            diagnostics: Vec::new(),
        }
    }
}

/// 🔤 Every `[a-zA-Z][a-zA-Z0-9]*` run, lower-cased. The classic word count.
#[derive(Debug, Clone)]
pub struct WordTally {
    pattern: Regex,
}

impl WordTally {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new("[a-zA-Z][a-zA-Z0-9]*")
            .context("💀 The word pattern failed to compile. It is twelve characters long. We are as surprised as you.")?;
        Ok(Self { pattern })
    }
}

impl Extract for WordTally {
    fn extract(&self, page: &str) -> Extraction {
        let entities = self
            .pattern
            .find_iter(page)
            .map(|word| ExtractedEntity::Tally {
                key: word.as_str().to_lowercase(),
            })
            .collect();
        Extraction {
            entities,
            diagnostics: Vec::new(),
        }
    }
}
