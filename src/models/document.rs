//! Input documents and per-document annotation results.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::EntityOutputMode;
use crate::engine::{Entities, Entity};

/// Error reported when a single document has no `text` field.
pub const MISSING_TEXT_ERROR: &str = "'text' field missing in the payload content.";

/// Error reported for a bulk document whose annotation never came back.
pub const UNFILLED_SLOT_ERROR: &str = "annotation engine produced no result for this document";

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// A document as submitted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InputDocument {
    #[serde(default)]
    pub text: Option<String>,
    /// Opaque caller value echoed back in the result. A present `null`
    /// counts as present.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub footer: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl InputDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: Value) -> Self {
        self.footer = Some(footer);
        self
    }

    /// Text worth sending to the engine: present and not blank.
    pub fn annotatable_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Annotations in the configured output shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Annotations {
    /// Entities keyed by entity id.
    Mapping(Entities),
    /// Entities in ascending id order.
    List(Vec<Entity>),
}

impl Annotations {
    pub fn reshape(entities: Entities, mode: EntityOutputMode) -> Self {
        match mode {
            EntityOutputMode::Dict => Self::Mapping(entities),
            EntityOutputMode::List => Self::List(entities.into_values().collect()),
        }
    }

    /// Empty annotations, always serialized as `[]`.
    pub fn empty() -> Self {
        Self::List(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(m) => m.len(),
            Self::List(l) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result for one input document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
    pub success: bool,
    pub timestamp: String,
    /// Wall-clock seconds spent annotating (the whole dispatch for bulk).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl DocumentResult {
    pub fn annotated(text: String, annotations: Annotations, elapsed_time: f64) -> Self {
        Self {
            text: Some(text),
            annotations: Some(annotations),
            success: true,
            timestamp: timestamp(),
            elapsed_time: Some(elapsed_time),
            footer: None,
            errors: None,
        }
    }

    /// Successful result with no annotations (blank or missing text in bulk).
    pub fn blank(text: String) -> Self {
        Self {
            text: Some(text),
            annotations: Some(Annotations::empty()),
            success: true,
            timestamp: timestamp(),
            elapsed_time: None,
            footer: None,
            errors: None,
        }
    }

    /// Single-document result for a payload without a `text` field.
    pub fn missing_text() -> Self {
        Self {
            text: None,
            annotations: None,
            success: false,
            timestamp: timestamp(),
            elapsed_time: None,
            footer: None,
            errors: Some(vec![MISSING_TEXT_ERROR.to_string()]),
        }
    }

    /// Bulk result for a document the engine never returned.
    pub fn unfilled(text: String) -> Self {
        Self {
            text: Some(text),
            annotations: Some(Annotations::empty()),
            success: false,
            timestamp: timestamp(),
            elapsed_time: None,
            footer: None,
            errors: Some(vec![UNFILLED_SLOT_ERROR.to_string()]),
        }
    }

    pub fn with_footer(mut self, footer: Option<Value>) -> Self {
        self.footer = footer;
        self
    }

    /// Number of annotations, zero when there are none.
    pub fn annotation_count(&self) -> usize {
        self.annotations.as_ref().map_or(0, Annotations::len)
    }
}
