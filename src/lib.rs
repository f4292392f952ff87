pub mod codegen;
pub mod config;
pub mod designer;
pub mod document;
pub mod graph;
pub mod model;

use serde::Deserialize;
use wasm_bindgen::prelude::*;

use config::DesignerConfig;
use designer::{Designer, GraphObserver};
use document::{SchemaDocument, import_document};
use graph::{Connection, FieldPatch, SchemaGraph};
use model::{FieldType, Position, RelationshipType};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Generate SQL DDL from an exported schema document
#[wasm_bindgen(js_name = "generateSql")]
pub fn generate_sql_from_json(document: &str) -> Result<String, String> {
    let graph = import_document(document, &DesignerConfig::default())
        .map_err(|e| format!("Failed to import schema: {}", e))?;
    Ok(codegen::generate_sql(&graph))
}

/// Forwards designer notifications to a JS callback as
/// `callback(kind, payload)` where kind is `"graph"` or `"code"`.
struct JsObserver {
    callback: js_sys::Function,
    config: DesignerConfig,
}

impl GraphObserver for JsObserver {
    fn graph_changed(&mut self, graph: &SchemaGraph) {
        match SchemaDocument::from_graph(graph, &self.config).to_json_pretty() {
            Ok(json) => self.emit("graph", &json),
            Err(e) => tracing::warn!(error = %e, "failed to encode graph for observer"),
        }
    }

    fn code_generated(&mut self, sql: &str) {
        self.emit("code", sql);
    }
}

impl JsObserver {
    fn emit(&self, kind: &str, payload: &str) {
        if let Err(e) = self.callback.call2(
            &JsValue::NULL,
            &JsValue::from_str(kind),
            &JsValue::from_str(payload),
        ) {
            tracing::warn!(kind, error = ?e, "observer callback threw");
        }
    }
}

#[derive(Deserialize)]
struct PatchInput {
    name: Option<String>,
    #[serde(rename = "type")]
    field_type: Option<String>,
    #[serde(rename = "isRequired")]
    required: Option<bool>,
    #[serde(rename = "isUnique")]
    unique: Option<bool>,
    #[serde(rename = "isPrimary")]
    primary: Option<bool>,
}

impl PatchInput {
    fn into_patch(self) -> Result<FieldPatch, String> {
        let field_type = match self.field_type {
            Some(tag) => Some(tag.parse::<FieldType>().map_err(|e| e.to_string())?),
            None => None,
        };
        Ok(FieldPatch {
            name: self.name,
            field_type,
            required: self.required,
            unique: self.unique,
            primary: self.primary,
        })
    }
}

/// Designer handle for a browser canvas.
#[wasm_bindgen(js_name = "SchemaDesigner")]
pub struct WasmDesigner {
    inner: Designer,
}

impl Default for WasmDesigner {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = "SchemaDesigner")]
impl WasmDesigner {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: Designer::default(),
        }
    }

    pub fn subscribe(&mut self, callback: js_sys::Function) {
        let config = self.inner.config().clone();
        self.inner.subscribe(Box::new(JsObserver { callback, config }));
    }

    #[wasm_bindgen(getter = projectName)]
    pub fn project_name(&self) -> String {
        self.inner.project_name().to_string()
    }

    #[wasm_bindgen(setter = projectName)]
    pub fn set_project_name(&mut self, name: &str) {
        self.inner.set_project_name(name);
    }

    #[wasm_bindgen(js_name = "addTable")]
    pub fn add_table(&mut self) -> String {
        self.inner.add_table()
    }

    #[wasm_bindgen(js_name = "renameTable")]
    pub fn rename_table(&mut self, table_id: &str, name: &str) -> bool {
        self.inner.rename_table(table_id, name)
    }

    #[wasm_bindgen(js_name = "moveTable")]
    pub fn move_table(&mut self, table_id: &str, x: f64, y: f64) -> bool {
        self.inner.move_table(table_id, Position { x, y })
    }

    #[wasm_bindgen(js_name = "removeTable")]
    pub fn remove_table(&mut self, table_id: &str) -> bool {
        self.inner.remove_table(table_id)
    }

    #[wasm_bindgen(js_name = "addField")]
    pub fn add_field(&mut self, table_id: &str) -> Option<String> {
        self.inner.add_field(table_id)
    }

    /// `patch` is a JSON object with any of `name`, `type`, `isRequired`,
    /// `isUnique`, `isPrimary`.
    #[wasm_bindgen(js_name = "updateField")]
    pub fn update_field(
        &mut self,
        table_id: &str,
        field_id: &str,
        patch: &str,
    ) -> Result<bool, String> {
        let input: PatchInput = serde_json::from_str(patch).map_err(|e| e.to_string())?;
        Ok(self.inner.update_field(table_id, field_id, input.into_patch()?))
    }

    #[wasm_bindgen(js_name = "deleteField")]
    pub fn delete_field(&mut self, table_id: &str, field_id: &str) -> bool {
        self.inner.delete_field(table_id, field_id)
    }

    pub fn connect(
        &mut self,
        source: Option<String>,
        source_handle: Option<String>,
        target: Option<String>,
        target_handle: Option<String>,
    ) -> Option<String> {
        self.inner.connect(&Connection {
            source,
            source_handle,
            target,
            target_handle,
        })
    }

    #[wasm_bindgen(js_name = "setRelationshipType")]
    pub fn set_relationship_type(&mut self, edge_id: &str, relationship: &str) -> bool {
        match RelationshipType::from_str(relationship) {
            Some(r) => self.inner.set_relationship_type(edge_id, r),
            None => false,
        }
    }

    #[wasm_bindgen(js_name = "removeEdge")]
    pub fn remove_edge(&mut self, edge_id: &str) -> bool {
        self.inner.remove_edge(edge_id)
    }

    #[wasm_bindgen(js_name = "importJson")]
    pub fn import_json(&mut self, text: &str) -> Result<(), String> {
        self.inner
            .import_json(text)
            .map_err(|e| format!("Failed to import schema: {}", e))
    }

    #[wasm_bindgen(js_name = "exportJson")]
    pub fn export_json(&self) -> Result<String, String> {
        self.inner.export_json().map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "exportFilename")]
    pub fn export_filename(&self) -> String {
        self.inner.config().export_filename.clone()
    }

    #[wasm_bindgen(js_name = "generateCode")]
    pub fn generate_code(&mut self) -> String {
        self.inner.generate_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_sql_from_json() {
        let doc = r#"{
            "schema": [{"id": "u", "tableName": "users",
                        "fields": [{"id": "id", "name": "id", "type": "INTEGER", "isPrimary": true}],
                        "primaryKeys": ["id"]}],
            "edges": []
        }"#;
        assert_eq!(
            generate_sql_from_json(doc).unwrap(),
            "CREATE TABLE users (\n  id INTEGER,\n  PRIMARY KEY (id)\n);"
        );

        let err = generate_sql_from_json(r#"{"schema": []}"#).unwrap_err();
        assert_eq!(err, "Failed to import schema: Invalid schema format");
    }

    #[test]
    fn test_patch_input() {
        let input: PatchInput =
            serde_json::from_str(r#"{"name": "email", "type": "string", "isUnique": true}"#).unwrap();
        let patch = input.into_patch().unwrap();
        assert_eq!(
            patch,
            FieldPatch::default()
                .name("email")
                .field_type(FieldType::String)
                .unique(true)
        );

        let bad: PatchInput = serde_json::from_str(r#"{"type": "BLOB"}"#).unwrap();
        assert!(bad.into_patch().is_err());
    }
}
