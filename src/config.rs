use crate::model::{FieldType, Position};
use rand::Rng;
use std::ops::Range;

/// Defaults the designer applies when creating, placing and exporting.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignerConfig {
    pub new_table_name: String,
    pub new_field_type: FieldType,
    pub placement_x: Range<f64>,
    pub placement_y: Range<f64>,
    pub export_version: String,
    pub export_filename: String,
    pub untitled_project_name: String,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            new_table_name: "New Table".to_string(),
            new_field_type: FieldType::Integer,
            placement_x: 100.0..400.0,
            placement_y: 100.0..300.0,
            export_version: "1.0.0".to_string(),
            export_filename: "schema.json".to_string(),
            untitled_project_name: "Untitled Project".to_string(),
        }
    }
}

impl DesignerConfig {
    /// Random canvas position inside the placement ranges.
    pub fn random_position(&self) -> Position {
        let mut rng = rand::thread_rng();
        Position {
            x: sample(&mut rng, &self.placement_x),
            y: sample(&mut rng, &self.placement_y),
        }
    }
}

fn sample(rng: &mut impl Rng, range: &Range<f64>) -> f64 {
    // gen_range panics on an empty range
    if range.is_empty() {
        range.start
    } else {
        rng.gen_range(range.clone())
    }
}
