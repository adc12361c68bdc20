//! 📦 Records: the building blocks of sift.
//!
//! 🎬 A line walks into a mapper. It gets split on tabs, squinted at, and either
//! promoted to an [`ExtractedEntity`] or quietly shown the door. The survivors get
//! projected into an [`OutputRecord`] and handed to a sink. Nobody keeps anything
//! around afterwards. Every record is a one-night stand with the CPU. 🦆
//!
//! Lifecycle, for the 3am reader:
//! ```text
//!   page (String) ──▶ RawRecord ──▶ ExtractedEntity ──▶ OutputRecord ──▶ Sink
//!                     (borrowed)     (owned, typed)       (key, value)
//! ```

use serde::Serialize;
use serde_json::Value;

/// 🔪 One tab-delimited line, freshly cut.
///
/// The fields are borrowed straight out of the page buffer. JSON pages skip this
/// stage entirely and go straight to a `serde_json::Value` root.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord<'a> {
    pub fields: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    /// ✂️ Split a line on `\t`, dropping trailing empty fields.
    ///
    /// `"a\t"` is one field, `"a\t\tb"` is three. Streaming harnesses have been
    /// splitting like this since before some of us were born, and downstream
    /// field-count checks depend on it.
    pub fn from_tab_line(line: &'a str) -> Self {
        let mut fields: Vec<&'a str> = line.split('\t').collect();
        while fields.last().is_some_and(|field| field.is_empty()) {
            fields.pop();
        }
        RawRecord { fields }
    }

    /// 📏 How many fields survived the split.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// 🎯 A semantic unit of interest. Only exists if the source record had the right shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedEntity {
    /// 🏷️ `(name, id)` where the id carried the marker.
    Named { name: String, id: String },
    /// 🔢 `(id, count)`, no questions asked.
    Counted { id: String, count: String },
    /// 💬 A social interaction pulled out of a JSON document.
    Interaction(Box<Interaction>),
    /// ➕ One occurrence of a key, destined for the harness's aggregate reducer.
    Tally { key: String },
}

/// 💬 The flattened interaction, in the exact key order the payload is serialized in.
///
/// Values stay as `serde_json::Value` so a numeric author id stays numeric and a
/// string one stays a string. The optional provenance fields vanish from the
/// payload when the document didn't have them, and stay `null` when it said `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    #[serde(rename = "objectId", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub author_id: Value,
    pub author_avatar: Value,
    pub author_link: Value,
    pub author_name: Value,
    pub author_username: Value,
    /// 📝 Free text. The only field that gets escaped on the way out.
    pub content: String,
    /// ⏰ `"Mon Jan 02 2023 10:00:00"`-ish. Tokenized on spaces for the sort key.
    pub created_at: String,
    pub link: Value,
    pub schema_version: Value,
    pub source: Value,
}

/// 📤 The final emitted unit. A key, a value, and a tab between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub key: String,
    pub value: String,
}

impl OutputRecord {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 🧵 `key\tvalue`, no trailing newline. The sink owns line termination.
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(self.key.len() + self.value.len() + 1);
        line.push_str(&self.key);
        line.push('\t');
        line.push_str(&self.value);
        line
    }
}
