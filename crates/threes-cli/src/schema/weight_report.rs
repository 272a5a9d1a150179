use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// JSON description of a weight file, printed by `threes inspect-weights`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeightReport {
    pub path: PathBuf,
    /// Learning sliders whose network fits the file.
    pub compatible_with: Vec<String>,
    pub tables: Vec<TableReport>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableReport {
    pub index: usize,
    pub entries: usize,
    pub nonzero: usize,
    pub min: f32,
    pub max: f32,
    pub mean_abs: f64,
}
