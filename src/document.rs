//! JSON schema document: export of the current graph and import that
//! replaces it wholesale.

use crate::config::DesignerConfig;
use crate::graph::SchemaGraph;
use crate::model::{
    EDGE_KIND, Edge, EdgeData, Field, FieldType, ForeignRef, Position, RelationshipType, Table,
    UnknownFieldType,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

/// A document that cannot be imported.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid schema format")]
    MissingArrays,
    #[error("Invalid table at index {index}: {source}")]
    Table {
        index: usize,
        source: serde_json::Error,
    },
    #[error("Invalid edge at index {index}: {source}")]
    Edge {
        index: usize,
        source: serde_json::Error,
    },
    #[error("Invalid field {field} in table {table}: {source}")]
    FieldType {
        table: String,
        field: String,
        source: UnknownFieldType,
    },
    #[error("Duplicate table id: {0}")]
    DuplicateTable(String),
    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),
    #[error("Duplicate field id {field} in table {table}")]
    DuplicateField { table: String, field: String },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Failed to encode schema: {0}")]
    Encode(serde_json::Error),
}

/// The export/import unit: `{ schema, edges, version }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    pub schema: Vec<Table>,
    pub edges: Vec<Edge>,
    pub version: String,
}

impl SchemaDocument {
    pub fn from_graph(graph: &SchemaGraph, config: &DesignerConfig) -> Self {
        Self {
            schema: graph.tables.clone(),
            edges: graph.edges.clone(),
            version: config.export_version.clone(),
        }
    }

    /// Validate and decode a document, filling in documented defaults.
    pub fn parse(text: &str, config: &DesignerConfig) -> Result<Self, FormatError> {
        let root: Value = serde_json::from_str(text)?;

        let (Some(raw_tables), Some(raw_edges)) = (
            root.get("schema").and_then(Value::as_array),
            root.get("edges").and_then(Value::as_array),
        ) else {
            return Err(FormatError::MissingArrays);
        };

        let mut schema = Vec::with_capacity(raw_tables.len());
        let mut table_ids = HashSet::new();
        for (index, value) in raw_tables.iter().enumerate() {
            let raw = RawTable::deserialize(value)
                .map_err(|source| FormatError::Table { index, source })?;
            let table = raw.into_table(config)?;
            if !table_ids.insert(table.id.clone()) {
                return Err(FormatError::DuplicateTable(table.id));
            }
            schema.push(table);
        }

        let mut edges = Vec::with_capacity(raw_edges.len());
        let mut edge_ids = HashSet::new();
        for (index, value) in raw_edges.iter().enumerate() {
            let raw = RawEdge::deserialize(value)
                .map_err(|source| FormatError::Edge { index, source })?;
            let edge = raw.into_edge();
            if !edge_ids.insert(edge.id.clone()) {
                return Err(FormatError::DuplicateEdge(edge.id));
            }
            edges.push(edge);
        }

        let version = root
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or(config.export_version.as_str())
            .to_string();

        Ok(Self {
            schema,
            edges,
            version,
        })
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn into_graph(self) -> SchemaGraph {
        SchemaGraph::from_parts(self.schema, self.edges)
    }
}

/// Pretty-printed JSON export of the graph.
pub fn export_document(graph: &SchemaGraph, config: &DesignerConfig) -> serde_json::Result<String> {
    SchemaDocument::from_graph(graph, config).to_json_pretty()
}

/// Decode a document into a fresh graph. Nothing is produced unless the
/// whole document is valid.
pub fn import_document(text: &str, config: &DesignerConfig) -> Result<SchemaGraph, FormatError> {
    let doc = SchemaDocument::parse(text, config)?;
    info!(
        tables = doc.schema.len(),
        edges = doc.edges.len(),
        "imported schema document"
    );
    Ok(doc.into_graph())
}

pub fn read_document(path: &Path, config: &DesignerConfig) -> Result<SchemaGraph, DocumentError> {
    let text = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(import_document(&text, config)?)
}

pub fn write_document(
    path: &Path,
    graph: &SchemaGraph,
    config: &DesignerConfig,
) -> Result<(), DocumentError> {
    let json = export_document(graph, config).map_err(DocumentError::Encode)?;
    fs::write(path, json).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTable {
    id: Option<String>,
    position: Option<Value>,
    table_name: Option<String>,
    fields: Option<Vec<RawField>>,
    primary_keys: Option<Vec<String>>,
}

impl RawTable {
    fn into_table(self, config: &DesignerConfig) -> Result<Table, FormatError> {
        let id = self.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let table_name = self.table_name.unwrap_or_default();

        let mut fields = Vec::new();
        let mut field_ids = HashSet::new();
        for raw in self.fields.unwrap_or_default() {
            let field = raw.into_field(&table_name)?;
            if !field_ids.insert(field.id.clone()) {
                return Err(FormatError::DuplicateField {
                    table: table_name,
                    field: field.id,
                });
            }
            fields.push(field);
        }

        let declared = self.primary_keys.unwrap_or_default();
        let (primary_keys, orphans): (Vec<String>, Vec<String>) = declared
            .into_iter()
            .partition(|k| field_ids.contains(k));
        if !orphans.is_empty() {
            warn!(table = %table_name, ?orphans, "dropping primary keys without a field");
        }

        let position = self
            .position
            .and_then(|value| serde_json::from_value::<Position>(value).ok())
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .unwrap_or_else(|| config.random_position());

        Ok(Table {
            id,
            position,
            table_name,
            fields,
            primary_keys,
        })
    }
}

#[derive(Deserialize)]
struct RawField {
    id: String,
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    #[serde(rename = "isPrimary")]
    primary: Option<bool>,
    #[serde(rename = "isRequired")]
    required: Option<bool>,
    #[serde(rename = "isUnique")]
    unique: Option<bool>,
    #[serde(rename = "isForeign")]
    foreign: Option<bool>,
    #[serde(rename = "foreignRef")]
    foreign_ref: Option<ForeignRef>,
    #[serde(rename = "relationType")]
    relation_type: Option<RelationshipType>,
}

impl RawField {
    fn into_field(self, table_name: &str) -> Result<Field, FormatError> {
        let field_type = match self.field_type.as_deref() {
            Some(tag) => tag.parse().map_err(|source| FormatError::FieldType {
                table: table_name.to_string(),
                field: self.id.clone(),
                source,
            })?,
            None => FieldType::default(),
        };

        Ok(Field {
            id: self.id,
            name: self.name.unwrap_or_default(),
            field_type,
            primary: self.primary.unwrap_or(false),
            required: self.required.unwrap_or(false),
            unique: self.unique.unwrap_or(false),
            foreign: self.foreign.unwrap_or(false),
            foreign_ref: self.foreign_ref,
            relation_type: self.relation_type,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEdge {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    source: String,
    source_handle: Option<String>,
    target: String,
    target_handle: Option<String>,
    data: Option<RawEdgeData>,
}

#[derive(Deserialize)]
struct RawEdgeData {
    relationship: Option<RelationshipType>,
}

impl RawEdge {
    fn into_edge(self) -> Edge {
        Edge {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind: self.kind.unwrap_or_else(|| EDGE_KIND.to_string()),
            source: self.source,
            source_handle: self.source_handle,
            target: self.target,
            target_handle: self.target_handle,
            data: EdgeData {
                relationship: self
                    .data
                    .and_then(|d| d.relationship)
                    .unwrap_or_default(),
            },
        }
    }
}
