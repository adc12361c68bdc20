//! 💬 The JSON interaction extractor.
//!
//! 🎬 The whole of stdin arrives as one page: a single JSON document with an
//! `interactions` array buried inside. Each element is a social interaction with an
//! author, some content, a timestamp, and provenance crumbs. We dig each one out into
//! an [`Interaction`] and let the projector worry about sort keys and escaping.
//!
//! Failure modes, all non-fatal:
//! - 💀 not JSON at all: one diagnostic with the raw input (escaped onto one line), no output
//! - 🕳️ no `interactions` array: one diagnostic, no output
//! - 🧩 an interaction missing a required field: that interaction is skipped with a
//!   diagnostic naming the missing path, its siblings still make it out

use serde_json::Value;

use super::{Extract, Extraction};
use crate::records::{ExtractedEntity, Interaction};

/// 💬 Zero config, all opinions.
#[derive(Debug, Clone, Copy, Default)]
pub struct InteractionExtractor;

impl Extract for InteractionExtractor {
    fn extract(&self, page: &str) -> Extraction {
        // -- 🏜️ nothing in, nothing out, nothing to complain about
        if page.is_empty() {
            return Extraction::default();
        }

        let root = match serde_json::from_str::<Value>(page) {
            Ok(document) => document,
            Err(err) => {
                return Extraction::from_diagnostic(format!(
                    "error processing input {page:?}: {err}"
                ));
            }
        };

        let Some(elements) = root.get("interactions").and_then(Value::as_array) else {
            return Extraction::from_diagnostic(
                "document skipped: `interactions` is missing or is not an array".to_string(),
            );
        };

        let mut extraction = Extraction::default();
        for (position, element) in elements.iter().enumerate() {
            match interaction_from(&root, element) {
                Ok(interaction) => extraction
                    .entities
                    .push(ExtractedEntity::Interaction(Box::new(interaction))),
                Err(reason) => extraction
                    .diagnostics
                    .push(format!("interaction #{position} skipped: {reason}")),
            }
        }
        extraction
    }
}

/// 🧭 Walk a dotted path. Missing and `null` are the same kind of missing here.
fn required<'v>(value: &'v Value, path: &str) -> Result<&'v Value, String> {
    let mut cursor = value;
    for segment in path.split('.') {
        cursor = match cursor.get(segment) {
            Some(Value::Null) | None => return Err(format!("missing `{path}`")),
            Some(next) => next,
        };
    }
    Ok(cursor)
}

fn required_str<'v>(value: &'v Value, path: &str) -> Result<&'v str, String> {
    required(value, path)?
        .as_str()
        .ok_or_else(|| format!("`{path}` is not a string"))
}

/// 🫥 Absent means absent, but a present `null` is kept and serialized as `null`.
fn optional(value: &Value, path: &str) -> Option<Value> {
    path.split('.')
        .try_fold(value, |cursor, segment| cursor.get(segment))
        .cloned()
}

fn interaction_from(root: &Value, element: &Value) -> Result<Interaction, String> {
    Ok(Interaction {
        object_id: optional(root, "id"),
        hash: optional(root, "hash"),
        id: optional(element, "interaction.id"),
        author_id: required(element, "interaction.author.id")?.clone(),
        author_avatar: required(element, "interaction.author.avatar")?.clone(),
        author_link: required(element, "interaction.author.link")?.clone(),
        author_name: required(element, "interaction.author.name")?.clone(),
        author_username: required(element, "interaction.author.username")?.clone(),
        content: required_str(element, "interaction.content")?.to_string(),
        created_at: required_str(element, "interaction.created_at")?.to_string(),
        link: required(element, "interaction.link")?.clone(),
        schema_version: required(element, "interaction.schema.version")?.clone(),
        source: required(element, "interaction.source")?.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn a_perfectly_normal_interaction(content: &str) -> Value {
        json!({
            "interaction": {
                "id": "1e2f",
                "author": {
                    "id": 31337,
                    "avatar": "https://img.example/a.png",
                    "link": "https://social.example/ford",
                    "name": "Ford Prefect",
                    "username": "ford"
                },
                "content": content,
                "created_at": "Mon Jan 02 2023 10:00:00",
                "link": "https://social.example/ford/status/1",
                "schema": { "version": 3 },
                "source": "web"
            }
        })
    }

    #[test]
    fn the_one_where_every_interaction_becomes_an_entity() {
        let document = json!({
            "id": "obj-1",
            "hash": "cafebabe",
            "interactions": [
                a_perfectly_normal_interaction("don't panic"),
                a_perfectly_normal_interaction("bring a towel"),
            ]
        });

        let extraction = InteractionExtractor.extract(&document.to_string());
        assert_eq!(extraction.entities.len(), 2);
        assert!(extraction.diagnostics.is_empty());

        let ExtractedEntity::Interaction(first) = &extraction.entities[0] else {
            panic!("💀 expected an interaction, serde took us somewhere else");
        };
        assert_eq!(first.object_id, Some(json!("obj-1")));
        assert_eq!(first.hash, Some(json!("cafebabe")));
        assert_eq!(first.id, Some(json!("1e2f")));
        assert_eq!(first.author_id, json!(31337));
        assert_eq!(first.content, "don't panic");
        assert_eq!(first.schema_version, json!(3));
    }

    #[test]
    fn the_one_where_garbage_json_gets_exactly_one_diagnostic() {
        let extraction = InteractionExtractor.extract("{\"interactions\": [oops\n");
        assert!(extraction.entities.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(!extraction.diagnostics[0].contains('\n'), "diagnostics are one line, always");
        assert!(extraction.diagnostics[0].contains("oops"), "the raw input rides along");
    }

    #[test]
    fn the_one_where_empty_input_is_just_quiet() {
        let extraction = InteractionExtractor.extract("");
        assert!(extraction.entities.is_empty());
        assert!(extraction.diagnostics.is_empty());
    }

    #[test]
    fn the_one_where_a_document_without_interactions_is_skipped() {
        let extraction = InteractionExtractor.extract(r#"{"id":"obj-1"}"#);
        assert!(extraction.entities.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
    }

    #[test]
    fn the_one_where_one_broken_interaction_does_not_sink_its_siblings() {
        let mut broken = a_perfectly_normal_interaction("i have no schema");
        broken["interaction"]
            .as_object_mut()
            .map(|interaction| interaction.remove("schema"));
        let document = json!({
            "interactions": [broken, a_perfectly_normal_interaction("i am fine")]
        });

        let extraction = InteractionExtractor.extract(&document.to_string());
        assert_eq!(extraction.entities.len(), 1);
        assert_eq!(
            extraction.diagnostics,
            vec!["interaction #0 skipped: missing `interaction.schema.version`".to_string()]
        );
    }

    #[test]
    fn the_one_where_null_author_fields_count_as_missing() {
        let mut nulled = a_perfectly_normal_interaction("hi");
        nulled["interaction"]["author"]["avatar"] = Value::Null;
        let document = json!({ "interactions": [nulled] });

        let extraction = InteractionExtractor.extract(&document.to_string());
        assert!(extraction.entities.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
    }

    #[test]
    fn the_one_where_numeric_content_is_rejected() {
        let mut numeric = a_perfectly_normal_interaction("placeholder");
        numeric["interaction"]["content"] = json!(42);
        let document = json!({ "interactions": [numeric] });

        let extraction = InteractionExtractor.extract(&document.to_string());
        assert_eq!(
            extraction.diagnostics,
            vec!["interaction #0 skipped: `interaction.content` is not a string".to_string()]
        );
    }

    #[test]
    fn the_one_where_provenance_is_optional() {
        let document = json!({ "interactions": [a_perfectly_normal_interaction("x")] });
        let extraction = InteractionExtractor.extract(&document.to_string());
        let ExtractedEntity::Interaction(only) = &extraction.entities[0] else {
            panic!("💀 expected an interaction");
        };
        assert_eq!(only.object_id, None);
        assert_eq!(only.hash, None);
    }

    #[test]
    fn the_one_where_a_null_object_id_is_still_written_down() -> Result<(), serde_json::Error> {
        let mut anonymous = a_perfectly_normal_interaction("who am i");
        anonymous["interaction"]["id"] = Value::Null;
        let document = json!({ "id": null, "interactions": [anonymous] });

        let extraction = InteractionExtractor.extract(&document.to_string());
        let ExtractedEntity::Interaction(only) = &extraction.entities[0] else {
            panic!("💀 expected an interaction");
        };
        assert_eq!(only.object_id, Some(Value::Null));
        assert_eq!(only.hash, None);
        assert_eq!(only.id, Some(Value::Null));

        let payload = serde_json::to_string(only.as_ref())?;
        assert!(payload.starts_with(r#"{"objectId":null,"id":null,"author_id":31337,"#));
        assert!(!payload.contains("hash"));
        Ok(())
    }
}
