//! Item data structures for backend entries.

use crate::notes::parse_notes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flat mapping from field key to field value.
///
/// Keys are the backend's field label when one exists, otherwise the field
/// id. A normalized map never holds an empty value.
pub type FieldMap = HashMap<String, String>;

/// Id of the free-text notes field.
pub const NOTES_FIELD_ID: &str = "notesPlain";

/// An item as returned by the backend's structured read.
///
/// Only the parts the broker needs are modeled; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Backend identifier
    #[serde(default)]
    pub id: String,

    /// Item title (the item name)
    #[serde(default)]
    pub title: String,

    /// Backend category, e.g. `API_CREDENTIAL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Field list
    #[serde(default)]
    pub fields: Vec<ItemField>,
}

/// A single field within an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemField {
    /// Field id, stable within the item
    pub id: String,

    /// Field type, e.g. `STRING` or `CONCEALED`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field value; scalars other than strings keep their JSON text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ItemField {
    /// Creates a string field.
    pub fn new(id: impl Into<String>, label: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type: Some("STRING".to_string()),
            label: label.map(str::to_string),
            value: Some(serde_json::Value::String(value.into())),
        }
    }

    /// Key under which this field is stored: the label, or the id when the
    /// label is missing or empty.
    pub fn key(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.id,
        }
    }

    /// Value as text. Null, arrays and objects count as absent.
    pub fn text(&self) -> Option<String> {
        match self.value.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl ItemRecord {
    /// Creates an empty item with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Adds a labeled field whose id equals its label.
    pub fn with_field(mut self, label: &str, value: impl Into<String>) -> Self {
        self.fields.push(ItemField::new(label, Some(label), value));
        self
    }

    /// Sets the notes field.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.fields.push(ItemField {
            id: NOTES_FIELD_ID.to_string(),
            field_type: Some("STRING".to_string()),
            label: Some(NOTES_FIELD_ID.to_string()),
            value: Some(serde_json::Value::String(notes.into())),
        });
        self
    }

    /// Looks up a field by label or id.
    pub fn field(&self, name: &str) -> Option<&ItemField> {
        self.fields
            .iter()
            .find(|f| f.label.as_deref() == Some(name) || f.id == name)
    }

    /// Normalizes the item into a [`FieldMap`].
    ///
    /// Fields with empty or absent values are dropped. The notes field is
    /// kept under its own key and also parsed for `key: value` pairs, which
    /// are merged last so they override structured fields of the same name.
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        let mut from_notes = Vec::new();

        for field in &self.fields {
            let Some(value) = field.text().filter(|v| !v.is_empty()) else {
                continue;
            };

            if field.id == NOTES_FIELD_ID {
                from_notes.push(parse_notes(&value));
            }
            map.insert(field.key().to_string(), value);
        }

        for (key, value) in from_notes.into_iter().flatten() {
            if !key.is_empty() && !value.is_empty() {
                map.insert(key, value);
            }
        }

        map
    }
}

/// Category assigned to items created by the broker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ItemCategory {
    /// API credential (default)
    #[default]
    ApiCredential,
    /// Login (username/password)
    Login,
    /// Single password
    Password,
    /// Secure note (free text)
    SecureNote,
    /// SSH key
    SshKey,
    /// Server
    Server,
    /// Database
    Database,
}

impl ItemCategory {
    /// Name as the backend CLI expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiCredential => "API_CREDENTIAL",
            Self::Login => "LOGIN",
            Self::Password => "PASSWORD",
            Self::SecureNote => "SECURE_NOTE",
            Self::SshKey => "SSH_KEY",
            Self::Server => "SERVER",
            Self::Database => "DATABASE",
        }
    }
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
