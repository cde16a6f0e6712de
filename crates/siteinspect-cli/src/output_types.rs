use serde::Serialize;
use siteinspect_core::models::{EdgeClassification, Point, TerrainBounds};
use tabled::Tabled;

/// Output for measure command
#[derive(Debug, Serialize)]
pub struct MeasureOutput {
    pub vertex_count: usize,
    pub area_m2: f64,
    pub area_text: String,
    pub perimeter_m: f64,
    pub centroid: Option<Point>,
    pub edges: Vec<EdgeInfo>,
}

#[derive(Debug, Serialize)]
pub struct EdgeInfo {
    pub index: usize,
    pub start: Point,
    pub end: Point,
    pub length_m: f64,
}

/// Table row for an edge
#[derive(Debug, Tabled)]
pub struct EdgeRow {
    #[tabled(rename = "Edge")]
    pub index: usize,
    #[tabled(rename = "From")]
    pub start: String,
    #[tabled(rename = "To")]
    pub end: String,
    #[tabled(rename = "Length")]
    pub length: String,
}

impl From<&EdgeInfo> for EdgeRow {
    fn from(edge: &EdgeInfo) -> Self {
        Self {
            index: edge.index,
            start: format!("{:.6}, {:.6}", edge.start.lng, edge.start.lat),
            end: format!("{:.6}, {:.6}", edge.end.lng, edge.end.lat),
            length: format!("{:.1} m", edge.length_m),
        }
    }
}

/// Output for bounds command
#[derive(Debug, Serialize)]
pub struct BoundsOutput {
    pub buffer_m: f64,
    pub bounds: TerrainBounds,
}

/// Output for setbacks command
#[derive(Debug, Serialize)]
pub struct SetbacksOutput {
    pub service: String,
    pub site_area_m2: f64,
    pub buildable_area_m2: f64,
    pub coverage_ratio: f64,
    pub calculation_method: String,
    pub edge_classifications: Vec<EdgeClassification>,
    pub buildable_coords: Vec<Vec<f64>>,
}

/// Table row for an edge classification
#[derive(Debug, Tabled)]
pub struct ClassificationRow {
    #[tabled(rename = "Edge")]
    pub index: usize,
    #[tabled(rename = "Role")]
    pub role: String,
    #[tabled(rename = "Setback")]
    pub setback: String,
}

impl From<&EdgeClassification> for ClassificationRow {
    fn from(classification: &EdgeClassification) -> Self {
        Self {
            index: classification.index,
            role: classification.role.as_str().to_string(),
            setback: format!("{} m", classification.setback),
        }
    }
}

/// Output for geocode command
#[derive(Debug, Serialize)]
pub struct GeocodeOutput {
    pub query: String,
    pub display_name: String,
    pub lng: f64,
    pub lat: f64,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub entries: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
