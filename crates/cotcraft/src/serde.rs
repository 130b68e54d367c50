//! JSON-deserializable schema and lookup table documents.
//!
//! Field names follow the camelCase of the schema files relays ship with
//! (`typeMatch`, `rangeMin`, `sizeLimit`, `relativeOffset`, ...). The
//! definitions convert into the raw types of [crate::field] and are compiled
//! from there.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{LoadError, TableError},
    field::{MessageLayout, Reference},
    lookup::LookupTables,
    schema::Schema,
};

/// Top-level schema document: shared references plus the message list.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SchemaDef {
    #[serde(default)]
    pub refs: Vec<RefDef>,
    pub messages: Vec<MessageDef>,
}

impl SchemaDef {
    pub fn compile(self) -> Result<Schema, LoadError> {
        let refs: Vec<Reference> = self.refs.into_iter().map(Into::into).collect();
        let messages: Vec<MessageLayout> = self.messages.into_iter().map(Into::into).collect();

        Ok(Schema::compile(&refs, &messages)?)
    }
}

/// A named reference layout.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RefDef {
    pub name: String,
    #[serde(default)]
    pub content: Vec<FieldDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

/// A message layout.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MessageDef {
    pub content: Vec<FieldDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub type_match: String,
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub range_min: f64,
    #[serde(default)]
    pub range_max: f64,
    #[serde(default)]
    pub converter: String,
    #[serde(default)]
    pub size_limit: usize,
    /// Absent or negative means "no fixed offset".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(default)]
    pub relative_offset: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// The three icon tables as ordered rows; a row's id is its position.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct TablesDef {
    /// `[category, group, uuid]` rows.
    #[serde(default)]
    pub icon_paths: Vec<Vec<String>>,
    /// `[name]` rows.
    #[serde(default)]
    pub icon_files: Vec<Vec<String>>,
    /// `[type, name]` rows.
    #[serde(default)]
    pub type_icons: Vec<Vec<String>>,
}

impl TryFrom<TablesDef> for LookupTables {
    type Error = TableError;

    fn try_from(value: TablesDef) -> Result<Self, Self::Error> {
        LookupTables::from_rows(&value.icon_paths, &value.icon_files, &value.type_icons)
    }
}
