//! Single owner of the schema graph. UI surfaces call into the designer
//! and receive the resulting graph and generated code through observers.

use crate::codegen::generate_sql;
use crate::config::DesignerConfig;
use crate::document::{FormatError, SchemaDocument, export_document, import_document};
use crate::graph::{Connection, FieldPatch, SchemaGraph};
use crate::model::{Position, RelationshipType};
use tracing::warn;

/// Sink for designer state. Both methods default to doing nothing.
pub trait GraphObserver {
    fn graph_changed(&mut self, _graph: &SchemaGraph) {}
    fn code_generated(&mut self, _sql: &str) {}
}

pub struct Designer {
    graph: SchemaGraph,
    config: DesignerConfig,
    project_name: String,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl Default for Designer {
    fn default() -> Self {
        Self::new(DesignerConfig::default())
    }
}

impl std::fmt::Debug for Designer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Designer")
            .field("graph", &self.graph)
            .field("project_name", &self.project_name)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Designer {
    pub fn new(config: DesignerConfig) -> Self {
        let project_name = config.untitled_project_name.clone();
        Self {
            graph: SchemaGraph::new(),
            config,
            project_name,
            observers: Vec::new(),
        }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn subscribe(&mut self, observer: Box<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    pub fn set_project_name(&mut self, name: &str) {
        let trimmed = name.trim();
        self.project_name = if trimmed.is_empty() {
            self.config.untitled_project_name.clone()
        } else {
            trimmed.to_string()
        };
    }

    pub fn add_table(&mut self) -> String {
        let id = self.graph.add_table(&self.config);
        self.notify();
        id
    }

    pub fn rename_table(&mut self, table_id: &str, name: &str) -> bool {
        let changed = self.graph.rename_table(table_id, name);
        self.notify_if(changed)
    }

    pub fn move_table(&mut self, table_id: &str, position: Position) -> bool {
        let changed = self.graph.move_table(table_id, position);
        self.notify_if(changed)
    }

    pub fn remove_table(&mut self, table_id: &str) -> bool {
        let changed = self.graph.remove_table(table_id);
        self.notify_if(changed)
    }

    pub fn add_field(&mut self, table_id: &str) -> Option<String> {
        let id = self.graph.add_field(table_id, &self.config);
        self.notify_if(id.is_some());
        id
    }

    pub fn update_field(&mut self, table_id: &str, field_id: &str, patch: FieldPatch) -> bool {
        let changed = self.graph.update_field(table_id, field_id, patch);
        self.notify_if(changed)
    }

    pub fn delete_field(&mut self, table_id: &str, field_id: &str) -> bool {
        let changed = self.graph.delete_field(table_id, field_id);
        self.notify_if(changed)
    }

    pub fn connect(&mut self, connection: &Connection) -> Option<String> {
        let id = self.graph.connect(connection);
        self.notify_if(id.is_some());
        id
    }

    pub fn set_relationship_type(&mut self, edge_id: &str, relationship: RelationshipType) -> bool {
        let changed = self.graph.set_relationship_type(edge_id, relationship);
        self.notify_if(changed)
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        let changed = self.graph.remove_edge(edge_id);
        self.notify_if(changed)
    }

    /// Replace the whole graph with an imported document. On failure the
    /// current graph is kept and observers are not notified.
    pub fn import_json(&mut self, text: &str) -> Result<(), FormatError> {
        match import_document(text, &self.config) {
            Ok(graph) => {
                self.graph = graph;
                self.notify();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "schema import rejected");
                Err(e)
            }
        }
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        export_document(&self.graph, &self.config)
    }

    pub fn document(&self) -> SchemaDocument {
        SchemaDocument::from_graph(&self.graph, &self.config)
    }

    /// Generate SQL for the current graph and hand it to observers.
    pub fn generate_code(&mut self) -> String {
        let sql = generate_sql(&self.graph);
        for observer in &mut self.observers {
            observer.code_generated(&sql);
        }
        sql
    }

    fn notify_if(&mut self, changed: bool) -> bool {
        if changed {
            self.notify();
        }
        changed
    }

    fn notify(&mut self) {
        for observer in &mut self.observers {
            observer.graph_changed(&self.graph);
        }
    }
}
