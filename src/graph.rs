//! In-memory schema graph and the operations that keep foreign-key
//! annotations on fields in step with relationship edges.
//!
//! Edges are the source of truth for foreign keys. Every operation that
//! touches edges re-projects them onto their target fields: the target
//! field becomes `foreign`, its `foreign_ref` points at the edge's source
//! table and field, and its `relation_type` mirrors the edge. When several
//! edges land on the same input handle the last one in edge order wins;
//! editing an edge's relationship moves it to the end of that order.
//! Fields no edge targets keep whatever annotation they already carry.

use crate::config::DesignerConfig;
use crate::model::{
    EDGE_KIND, Edge, EdgeData, Field, FieldType, ForeignRef, Position, RelationshipType, Table,
};
use tracing::debug;
use uuid::Uuid;

/// A connection request from the canvas: both endpoints and their handles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Connection {
    pub source: Option<String>,
    pub source_handle: Option<String>,
    pub target: Option<String>,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
        target_handle: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source.into()),
            source_handle: Some(source_handle.into()),
            target: Some(target.into()),
            target_handle: Some(target_handle.into()),
        }
    }

    fn is_empty(&self) -> bool {
        self.source.is_none()
            && self.source_handle.is_none()
            && self.target.is_none()
            && self.target_handle.is_none()
    }
}

/// Partial update of a field's editable properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub name: Option<String>,
    pub field_type: Option<FieldType>,
    pub required: Option<bool>,
    pub unique: Option<bool>,
    pub primary: Option<bool>,
}

impl FieldPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    pub fn primary(mut self, primary: bool) -> Self {
        self.primary = Some(primary);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaGraph {
    pub tables: Vec<Table>,
    pub edges: Vec<Edge>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from already validated parts and project its edges.
    pub fn from_parts(tables: Vec<Table>, edges: Vec<Edge>) -> Self {
        let mut graph = Self { tables, edges };
        graph.sync_foreign_refs();
        graph
    }

    pub fn table(&self, table_id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn table_mut(&mut self, table_id: &str) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == table_id)
    }

    pub fn edge(&self, edge_id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == edge_id)
    }

    pub fn field(&self, table_id: &str, field_id: &str) -> Option<&Field> {
        self.table(table_id).and_then(|t| t.field(field_id))
    }

    /// Draw a relationship edge from a source field to a target field.
    ///
    /// Every part of the connection must be present and resolve to an
    /// existing handle; anything else is ignored. Returns the new edge id.
    pub fn connect(&mut self, connection: &Connection) -> Option<String> {
        if connection.is_empty() {
            debug!("ignoring empty connection");
            return None;
        }

        let (Some(source), Some(source_handle), Some(target), Some(target_handle)) = (
            connection.source.as_deref(),
            connection.source_handle.as_deref(),
            connection.target.as_deref(),
            connection.target_handle.as_deref(),
        ) else {
            debug!(?connection, "ignoring partial connection");
            return None;
        };

        let source_ok = self
            .table(source)
            .is_some_and(|t| t.fields.iter().any(|f| f.output_handle() == source_handle));
        let target_ok = self
            .table(target)
            .is_some_and(|t| t.fields.iter().any(|f| f.input_handle() == target_handle));
        if !source_ok || !target_ok {
            debug!(?connection, "ignoring connection to unknown handle");
            return None;
        }

        let duplicate = self.edges.iter().any(|e| {
            e.source == source
                && e.target == target
                && e.source_handle.as_deref() == Some(source_handle)
                && e.target_handle.as_deref() == Some(target_handle)
        });
        if duplicate {
            debug!(?connection, "connection already exists");
            return None;
        }

        let id = format!("xy-edge__{source}{source_handle}-{target}{target_handle}");
        self.edges.push(Edge {
            id: id.clone(),
            kind: EDGE_KIND.to_string(),
            source: source.to_string(),
            source_handle: Some(source_handle.to_string()),
            target: target.to_string(),
            target_handle: Some(target_handle.to_string()),
            data: EdgeData::default(),
        });
        self.sync_foreign_refs();

        Some(id)
    }

    /// Change an edge's relationship classification and mirror it onto
    /// the target field. Unknown edges and edges missing a handle are
    /// left untouched.
    pub fn set_relationship_type(&mut self, edge_id: &str, relationship: RelationshipType) -> bool {
        let Some(pos) = self.edges.iter().position(|e| e.id == edge_id) else {
            debug!(edge_id, "relationship edit for unknown edge");
            return false;
        };
        let edge = &self.edges[pos];
        if edge.source_handle.is_none() || edge.target_handle.is_none() {
            debug!(edge_id, "relationship edit for edge without handles");
            return false;
        }

        let mut edge = self.edges.remove(pos);
        edge.data.relationship = relationship;
        self.edges.push(edge);
        self.sync_foreign_refs();
        true
    }

    /// Remove an edge. Its target field loses the foreign annotation
    /// unless another edge still lands on the same handle.
    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let Some(pos) = self.edges.iter().position(|e| e.id == edge_id) else {
            return false;
        };
        let edge = self.edges.remove(pos);
        self.retract(&edge);
        self.sync_foreign_refs();
        true
    }

    pub fn add_table(&mut self, config: &DesignerConfig) -> String {
        let id = Uuid::new_v4().to_string();
        self.tables.push(Table {
            id: id.clone(),
            position: config.random_position(),
            table_name: config.new_table_name.clone(),
            fields: Vec::new(),
            primary_keys: Vec::new(),
        });
        id
    }

    pub fn rename_table(&mut self, table_id: &str, name: impl Into<String>) -> bool {
        match self.table_mut(table_id) {
            Some(table) => {
                table.table_name = name.into();
                true
            }
            None => false,
        }
    }

    /// Move a table on the canvas. Non-finite coordinates are rejected.
    pub fn move_table(&mut self, table_id: &str, position: Position) -> bool {
        if !position.x.is_finite() || !position.y.is_finite() {
            debug!(table_id, ?position, "ignoring non-finite position");
            return false;
        }
        match self.table_mut(table_id) {
            Some(table) => {
                table.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a table together with every edge attached to it.
    pub fn remove_table(&mut self, table_id: &str) -> bool {
        let Some(pos) = self.tables.iter().position(|t| t.id == table_id) else {
            return false;
        };
        self.tables.remove(pos);

        let (detached, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.source == table_id || e.target == table_id);
        self.edges = kept;
        for edge in &detached {
            self.retract(edge);
        }
        self.sync_foreign_refs();
        true
    }

    /// Append a blank field to a table. Returns the new field id.
    pub fn add_field(&mut self, table_id: &str, config: &DesignerConfig) -> Option<String> {
        let Some(table) = self.table_mut(table_id) else {
            debug!(table_id, "add field to unknown table");
            return None;
        };
        let id = Uuid::new_v4().to_string();
        table.fields.push(Field::new(id.clone(), "", config.new_field_type));
        Some(id)
    }

    /// Apply a patch to one field. Toggling `primary` keeps the table's
    /// primary key list in step.
    pub fn update_field(&mut self, table_id: &str, field_id: &str, patch: FieldPatch) -> bool {
        let Some(table) = self.table_mut(table_id) else {
            return false;
        };
        let Some(field) = table.field_mut(field_id) else {
            return false;
        };

        if let Some(name) = patch.name {
            field.name = name;
        }
        if let Some(field_type) = patch.field_type {
            field.field_type = field_type;
        }
        if let Some(required) = patch.required {
            field.required = required;
        }
        if let Some(unique) = patch.unique {
            field.unique = unique;
        }
        if let Some(primary) = patch.primary {
            field.primary = primary;
            let listed = table.primary_keys.iter().any(|k| k == field_id);
            if primary && !listed {
                table.primary_keys.push(field_id.to_string());
            } else if !primary && listed {
                table.primary_keys.retain(|k| k != field_id);
            }
        }
        true
    }

    /// Delete a field. Edges and foreign references pointing at it from
    /// other fields are left as they are.
    pub fn delete_field(&mut self, table_id: &str, field_id: &str) -> bool {
        let Some(table) = self.table_mut(table_id) else {
            return false;
        };
        let before = table.fields.len();
        table.fields.retain(|f| f.id != field_id);
        if table.fields.len() == before {
            return false;
        }
        table.primary_keys.retain(|k| k != field_id);
        true
    }

    /// Re-project every edge onto its target field.
    pub fn sync_foreign_refs(&mut self) {
        let projections: Vec<(String, String, ForeignRef, RelationshipType)> = self
            .edges
            .iter()
            .filter_map(|edge| {
                let source_field = edge.source_field_id()?;
                let target_field = edge.target_field_id()?;
                Some((
                    edge.target.clone(),
                    target_field.to_string(),
                    ForeignRef {
                        node_id: edge.source.clone(),
                        field_id: source_field.to_string(),
                    },
                    edge.relationship(),
                ))
            })
            .collect();

        for (table_id, field_id, foreign_ref, relationship) in projections {
            if let Some(field) = self
                .table_mut(&table_id)
                .and_then(|t| t.field_mut(&field_id))
            {
                field.foreign = true;
                field.foreign_ref = Some(foreign_ref);
                field.relation_type = Some(relationship);
            }
        }
    }

    fn retract(&mut self, edge: &Edge) {
        let Some(field_id) = edge.target_field_id() else {
            return;
        };
        if let Some(field) = self
            .table_mut(&edge.target)
            .and_then(|t| t.field_mut(field_id))
        {
            field.clear_foreign();
        }
    }
}
