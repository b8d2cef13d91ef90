use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SOURCE_FILE: &str = "SourceFile";

/// Metadata fields for one media item, as reported by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRecord {
    fields: Map<String, Value>,
}

impl MediaRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Textual value of `field`. `None` only when the field is absent; a present
    /// but empty field yields `Some("")`.
    pub fn get(&self, field: &str) -> Option<String> {
        self.fields.get(field).map(value_to_text)
    }

    /// First present field from `names`, in priority order.
    pub fn first_present<'a>(&self, names: &[&'a str]) -> Option<(&'a str, String)> {
        names
            .iter()
            .find_map(|name| self.get(name).map(|value| (*name, value)))
    }

    pub fn source_file(&self) -> Option<String> {
        self.get(SOURCE_FILE)
    }
}

impl From<Map<String, Value>> for MediaRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
