//! SQL DDL generation from a schema graph.

use crate::graph::SchemaGraph;
use crate::model::{ForeignRef, Table};

const UNKNOWN_TABLE: &str = "UNKNOWN_TABLE";
const UNKNOWN_FIELD: &str = "UNKNOWN_FIELD";

/// Generate one `CREATE TABLE` statement per table, in table order,
/// separated by a blank line.
pub fn generate_sql(graph: &SchemaGraph) -> String {
    graph
        .tables
        .iter()
        .map(|table| create_table(graph, table))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn create_table(graph: &SchemaGraph, table: &Table) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut fk_lines: Vec<String> = Vec::new();

    for field in &table.fields {
        let mut parts = vec![format!("{} {}", field.name, field.field_type)];
        if field.required {
            parts.push("NOT NULL".to_string());
        }
        if field.unique {
            parts.push("UNIQUE".to_string());
        }
        lines.push(format!("  {}", parts.join(" ")));

        if field.foreign {
            if let Some(foreign_ref) = &field.foreign_ref {
                fk_lines.push(format!(
                    "  FOREIGN KEY ({}) REFERENCES {}({})",
                    field.name,
                    table_name(graph, &foreign_ref.node_id),
                    field_name(graph, foreign_ref)
                ));
            }
        }
    }

    if let Some(pk) = primary_key_clause(table) {
        lines.push(format!("  {}", pk));
    }

    lines.extend(fk_lines);
    format!("CREATE TABLE {} (\n{}\n);", table.table_name, lines.join(",\n"))
}

/// `PRIMARY KEY (...)` over the declared key ids that still resolve to a
/// named field. One key or several, the clause is emitted once.
fn primary_key_clause(table: &Table) -> Option<String> {
    let names: Vec<&str> = table
        .primary_keys
        .iter()
        .filter_map(|id| table.field(id))
        .map(|f| f.name.as_str())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(format!("PRIMARY KEY ({})", names.join(", ")))
    }
}

fn table_name<'a>(graph: &'a SchemaGraph, table_id: &str) -> &'a str {
    graph
        .table(table_id)
        .map(|t| t.table_name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_TABLE)
}

fn field_name<'a>(graph: &'a SchemaGraph, foreign_ref: &ForeignRef) -> &'a str {
    graph
        .field(&foreign_ref.node_id, &foreign_ref.field_id)
        .map(|f| f.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Connection;
    use crate::model::{Field, FieldType, Position};

    fn table(id: &str, name: &str, fields: Vec<Field>, primary_keys: &[&str]) -> Table {
        Table {
            id: id.to_string(),
            position: Position::default(),
            table_name: name.to_string(),
            fields,
            primary_keys: primary_keys.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn users() -> Table {
        let mut id = Field::new("id", "id", FieldType::Integer);
        id.primary = true;
        let mut email = Field::new("email", "email", FieldType::String);
        email.required = true;
        email.unique = true;
        table("users_tbl", "users", vec![id, email], &["id"])
    }

    fn orders() -> Table {
        table(
            "orders_tbl",
            "orders",
            vec![
                Field::new("oid", "id", FieldType::Integer),
                Field::new("user_id", "user_id", FieldType::Integer),
            ],
            &["oid"],
        )
    }

    #[test]
    fn test_generate_users_table() {
        let graph = SchemaGraph::from_parts(vec![users()], vec![]);
        assert_eq!(
            generate_sql(&graph),
            "CREATE TABLE users (\n  id INTEGER,\n  email STRING NOT NULL UNIQUE,\n  PRIMARY KEY (id)\n);"
        );
    }

    #[test]
    fn test_generate_foreign_key_after_connect() {
        let mut graph = SchemaGraph::from_parts(vec![users(), orders()], vec![]);
        graph
            .connect(&Connection::new("users_tbl", "id-out", "orders_tbl", "user_id-in"))
            .unwrap();

        let sql = generate_sql(&graph);
        assert!(sql.contains(
            "CREATE TABLE orders (\n  id INTEGER,\n  user_id INTEGER,\n  PRIMARY KEY (id),\n  FOREIGN KEY (user_id) REFERENCES users(id)\n);"
        ));
        // blank line between statements
        assert!(sql.contains(");\n\nCREATE TABLE orders"));
    }

    #[test]
    fn test_composite_primary_key() {
        let t = table(
            "t",
            "memberships",
            vec![
                Field::new("a", "user_id", FieldType::Integer),
                Field::new("b", "group_id", FieldType::Integer),
            ],
            &["a", "b"],
        );
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t], vec![]));
        assert_eq!(sql.matches("PRIMARY KEY").count(), 1);
        assert!(sql.contains("  PRIMARY KEY (user_id, group_id)"));
        assert!(sql.contains("  user_id INTEGER,\n"));
    }

    #[test]
    fn test_no_primary_key() {
        let t = table("t", "logs", vec![Field::new("m", "msg", FieldType::Text)], &[]);
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t], vec![]));
        assert_eq!(sql, "CREATE TABLE logs (\n  msg TEXT\n);");
    }

    #[test]
    fn test_orphan_primary_keys_are_filtered() {
        let t = table(
            "t",
            "items",
            vec![Field::new("a", "sku", FieldType::String)],
            &["gone", "a"],
        );
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t.clone()], vec![]));
        assert!(sql.contains("PRIMARY KEY (sku)"));

        let only_orphans = table("t", "items", t.fields, &["gone", "also_gone"]);
        let sql = generate_sql(&SchemaGraph::from_parts(vec![only_orphans], vec![]));
        assert!(!sql.contains("PRIMARY KEY"));
    }

    #[test]
    fn test_unresolved_reference_placeholders() {
        let mut graph = SchemaGraph::from_parts(vec![users(), orders()], vec![]);
        graph
            .connect(&Connection::new("users_tbl", "id-out", "orders_tbl", "user_id-in"))
            .unwrap();

        graph.delete_field("users_tbl", "id");
        let sql = generate_sql(&graph);
        assert!(sql.contains("FOREIGN KEY (user_id) REFERENCES users(UNKNOWN_FIELD)"));

        graph.remove_table("users_tbl");
        // removing the table drops the edge, so the key disappears with it
        assert!(!generate_sql(&graph).contains("FOREIGN KEY"));
    }

    #[test]
    fn test_unknown_table_placeholder() {
        let mut field = Field::new("f", "owner_id", FieldType::Integer);
        field.foreign = true;
        field.foreign_ref = Some(ForeignRef {
            node_id: "ghost".to_string(),
            field_id: "id".to_string(),
        });
        let t = table("t", "pets", vec![field], &[]);
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t], vec![]));
        assert!(sql.contains("FOREIGN KEY (owner_id) REFERENCES UNKNOWN_TABLE(UNKNOWN_FIELD)"));
    }

    #[test]
    fn test_foreign_ref_without_flag_is_ignored() {
        let mut field = Field::new("f", "owner_id", FieldType::Integer);
        field.foreign_ref = Some(ForeignRef {
            node_id: "t".to_string(),
            field_id: "f".to_string(),
        });
        let t = table("t", "pets", vec![field], &[]);
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t], vec![]));
        assert!(!sql.contains("FOREIGN KEY"));
    }

    #[test]
    fn test_empty_table_and_empty_graph() {
        let t = table("t", "New Table", vec![], &[]);
        let sql = generate_sql(&SchemaGraph::from_parts(vec![t], vec![]));
        assert_eq!(sql, "CREATE TABLE New Table (\n\n);");
        assert_eq!(generate_sql(&SchemaGraph::new()), "");
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut graph = SchemaGraph::from_parts(vec![users(), orders()], vec![]);
        graph
            .connect(&Connection::new("users_tbl", "id-out", "orders_tbl", "user_id-in"))
            .unwrap();
        assert_eq!(generate_sql(&graph), generate_sql(&graph.clone()));
    }
}
