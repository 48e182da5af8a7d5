use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named property as exposed by the platform or the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntry {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl PropertyEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// A value counts as filled unless it is null, empty or whitespace-only.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Bool(_) | Value::Number(_) | Value::Object(_) => true,
        }
    }

    /// Display form of the value; empty for null.
    #[must_use]
    pub fn display_value(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Fill ratio of the required parameters of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compliance {
    pub filled: usize,
    pub total: usize,
    pub pct: u8,
}

impl Compliance {
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pct == 100
    }
}

/// One analyzed building element.
///
/// `viewer_db_id` is runtime-only. The analyzer leaves it empty and
/// `ViewerCorrelationResolver::attach_viewer_ids` fills it for the loaded
/// model; it is not stable across viewer sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRow {
    pub element_id: String,
    #[serde(default)]
    pub external_element_id: Option<String>,
    #[serde(default)]
    pub revit_element_id: Option<String>,
    #[serde(default)]
    pub viewer_db_id: Option<u64>,
    pub category: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub type_mark: String,
    #[serde(default)]
    pub assembly_code: String,
    #[serde(default)]
    pub assembly_description: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub model: String,
    pub compliance: Compliance,
}
