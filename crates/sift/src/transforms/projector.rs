//! 📐 The Field Projector: entity in, `(key, value)` out.
//!
//! Tab-split entities pass straight through. Tallies get the aggregate prefix and a
//! lonely `1`. Interactions get the full treatment: a sort key carved out of the
//! timestamp, content scrubbed of control characters, and the whole thing serialized
//! to a single JSON line.

use anyhow::{Context, Result};
use serde::Serialize;

use super::Project;
use super::escape::{EscapeMode, escape_control_chars};
use crate::records::{ExtractedEntity, Interaction, OutputRecord};

/// ➕ The key prefix the harness's aggregate reducer sums over.
pub const LONG_VALUE_SUM: &str = "LongValueSum:";

/// 📦 The wire shape of a flattened interaction.
#[derive(Debug, Serialize)]
struct InteractionPayload<'a> {
    key_date: &'a str,
    content: &'a Interaction,
}

/// 📅 `"Mon Jan 02 2023 10:00:00"` → `"Jan 02 2023"`.
///
/// Tokens 1..=3 of a single-space split, re-joined with single spaces. Missing
/// positions come out as empty strings, so a short timestamp still yields a key
/// (an ugly one, but a key).
pub fn sort_key(created_at: &str) -> String {
    let tokens: Vec<&str> = created_at.split(' ').collect();
    (1..=3)
        .map(|position| tokens.get(position).copied().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 📐 One projector to shape them all. The only knob is how hard to escape.
#[derive(Debug, Clone, Copy, Default)]
pub struct Projector {
    escape_mode: EscapeMode,
}

impl Projector {
    pub fn new(escape_mode: EscapeMode) -> Self {
        Self { escape_mode }
    }
}

impl Project for Projector {
    fn project(&self, entity: ExtractedEntity) -> Result<OutputRecord> {
        match entity {
            ExtractedEntity::Named { name, id } => Ok(OutputRecord::new(name, id)),
            ExtractedEntity::Counted { id, count } => Ok(OutputRecord::new(id, count)),
            ExtractedEntity::Tally { key } => {
                Ok(OutputRecord::new(format!("{LONG_VALUE_SUM}{key}"), "1"))
            }
            ExtractedEntity::Interaction(mut interaction) => {
                let key_date = sort_key(&interaction.created_at);
                interaction.content = escape_control_chars(&interaction.content, self.escape_mode);
                let payload = serde_json::to_string(&InteractionPayload {
                    key_date: &key_date,
                    content: &interaction,
                })
                .context("💀 The interaction refused to become JSON. It was JSON five minutes ago. We have questions.")?;
                Ok(OutputRecord::new(key_date, payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn an_interaction(content: &str, created_at: &str) -> ExtractedEntity {
        ExtractedEntity::Interaction(Box::new(Interaction {
            object_id: Some(json!("obj-1")),
            hash: Some(json!("cafebabe")),
            id: Some(json!("1e2f")),
            author_id: json!(31337),
            author_avatar: json!("a.png"),
            author_link: json!("https://social.example/ford"),
            author_name: json!("Ford Prefect"),
            author_username: json!("ford"),
            content: content.to_string(),
            created_at: created_at.to_string(),
            link: json!("https://social.example/ford/status/1"),
            schema_version: json!(3),
            source: json!("web"),
        }))
    }

    #[test]
    fn the_one_where_the_sort_key_is_month_day_year() {
        assert_eq!(sort_key("Mon Jan 02 2023 10:00:00"), "Jan 02 2023");
    }

    #[test]
    fn the_one_where_short_timestamps_get_empty_slots() {
        assert_eq!(sort_key("Mon Jan"), "Jan  ");
        assert_eq!(sort_key(""), "  ");
    }

    #[test]
    fn the_one_where_tab_entities_pass_through_untouched() -> Result<()> {
        let projector = Projector::default();
        let named = projector.project(ExtractedEntity::Named {
            name: "Arthur Dent".to_string(),
            id: "/guid/42".to_string(),
        })?;
        assert_eq!(named.to_line(), "Arthur Dent\t/guid/42");

        let counted = projector.project(ExtractedEntity::Counted {
            id: "/guid/42".to_string(),
            count: "7".to_string(),
        })?;
        assert_eq!(counted.to_line(), "/guid/42\t7");
        Ok(())
    }

    #[test]
    fn the_one_where_tallies_speak_aggregate() -> Result<()> {
        let record = Projector::default().project(ExtractedEntity::Tally {
            key: "towel".to_string(),
        })?;
        assert_eq!(record.to_line(), "LongValueSum:towel\t1");
        Ok(())
    }

    #[test]
    fn the_one_where_an_interaction_becomes_a_keyed_json_line() -> Result<()> {
        let record =
            Projector::default().project(an_interaction("hi", "Mon Jan 02 2023 10:00:00"))?;
        assert_eq!(record.key, "Jan 02 2023");

        let payload: Value = serde_json::from_str(&record.value)?;
        assert_eq!(payload["key_date"], "Jan 02 2023");
        assert_eq!(payload["content"]["objectId"], "obj-1");
        assert_eq!(payload["content"]["author_id"], 31337);
        assert_eq!(payload["content"]["schema_version"], 3);
        assert!(record.value.starts_with(r#"{"key_date":"Jan 02 2023","content":{"objectId":"obj-1","hash":"cafebabe","id":"1e2f","author_id":31337,"#));
        Ok(())
    }

    #[test]
    fn the_one_where_content_newlines_never_break_the_line() -> Result<()> {
        let record = Projector::default()
            .project(an_interaction("so long\nand thanks", "Mon Jan 02 2023 10:00:00"))?;
        assert!(!record.to_line().contains('\n'));

        let payload: Value = serde_json::from_str(&record.value)?;
        assert_eq!(payload["content"]["content"], "so long\\nand thanks");
        Ok(())
    }

    #[test]
    fn the_one_where_legacy_escaping_is_opt_in() -> Result<()> {
        let record = Projector::new(EscapeMode::FirstOccurrence)
            .project(an_interaction("a\nb\nc", "Mon Jan 02 2023"))?;
        let payload: Value = serde_json::from_str(&record.value)?;
        assert_eq!(payload["content"]["content"], "a\\nb\nc");
        Ok(())
    }
}
