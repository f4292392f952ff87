//! Schema data model: tables, fields and relationship edges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix of a field's input (target) handle.
pub const INPUT_HANDLE_SUFFIX: &str = "-in";
/// Suffix of a field's output (source) handle.
pub const OUTPUT_HANDLE_SUFFIX: &str = "-out";
/// Edge `type` the canvas renders relationship edges with.
pub const EDGE_KIND: &str = "custom-edge";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub position: Position,
    pub table_name: String,
    pub fields: Vec<Field>,
    /// Field ids forming the primary key, in declaration order.
    pub primary_keys: Vec<String>,
}

impl Table {
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn field_mut(&mut self, field_id: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.id == field_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "isPrimary")]
    pub primary: bool,
    #[serde(rename = "isRequired")]
    pub required: bool,
    #[serde(rename = "isUnique")]
    pub unique: bool,
    #[serde(rename = "isForeign")]
    pub foreign: bool,
    #[serde(rename = "foreignRef")]
    pub foreign_ref: Option<ForeignRef>,
    #[serde(rename = "relationType")]
    pub relation_type: Option<RelationshipType>,
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            primary: false,
            required: false,
            unique: false,
            foreign: false,
            foreign_ref: None,
            relation_type: None,
        }
    }

    pub fn input_handle(&self) -> String {
        format!("{}{}", self.id, INPUT_HANDLE_SUFFIX)
    }

    pub fn output_handle(&self) -> String {
        format!("{}{}", self.id, OUTPUT_HANDLE_SUFFIX)
    }

    /// Drop the foreign-key annotation.
    pub fn clear_foreign(&mut self) {
        self.foreign = false;
        self.foreign_ref = None;
        self.relation_type = None;
    }
}

/// Recover a field id from a handle id by stripping `suffix`.
/// A handle without the suffix is taken to be the field id itself.
pub fn field_id_from_handle<'a>(handle: &'a str, suffix: &str) -> &'a str {
    handle.strip_suffix(suffix).unwrap_or(handle)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignRef {
    pub node_id: String,
    pub field_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    #[default]
    Integer,
    String,
    Text,
    Boolean,
    Date,
    Datetime,
    Float,
    Decimal,
    Json,
    Uuid,
    Enum,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        Self::Integer,
        Self::String,
        Self::Text,
        Self::Boolean,
        Self::Date,
        Self::Datetime,
        Self::Float,
        Self::Decimal,
        Self::Json,
        Self::Uuid,
        Self::Enum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::String => "STRING",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Datetime => "DATETIME",
            Self::Float => "FLOAT",
            Self::Decimal => "DECIMAL",
            Self::Json => "JSON",
            Self::Uuid => "UUID",
            Self::Enum => "ENUM",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown field type: {0}")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelationshipType {
    #[default]
    #[serde(rename = "1:1")]
    OneToOne,
    #[serde(rename = "1:N")]
    OneToMany,
    #[serde(rename = "N:N")]
    ManyToMany,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:N",
            Self::ManyToMany => "N:N",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1:1" => Some(Self::OneToOne),
            "1:N" => Some(Self::OneToMany),
            "N:N" => Some(Self::ManyToMany),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeData {
    pub relationship: RelationshipType,
}

/// Relationship edge from a source field's output handle to a target
/// field's input handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub source_handle: Option<String>,
    pub target: String,
    pub target_handle: Option<String>,
    pub data: EdgeData,
}

impl Edge {
    /// Source field id, if the edge carries an output handle.
    pub fn source_field_id(&self) -> Option<&str> {
        self.source_handle
            .as_deref()
            .map(|h| field_id_from_handle(h, OUTPUT_HANDLE_SUFFIX))
    }

    /// Target field id, if the edge carries an input handle.
    pub fn target_field_id(&self) -> Option<&str> {
        self.target_handle
            .as_deref()
            .map(|h| field_id_from_handle(h, INPUT_HANDLE_SUFFIX))
    }

    pub fn relationship(&self) -> RelationshipType {
        self.data.relationship
    }
}
