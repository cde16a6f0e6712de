//! Setback inputs and per-edge classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::geometry::Edge;

/// Setback distances in meters.
///
/// Construction is tolerant: non-numeric, missing, negative or non-finite inputs
/// become 0 rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SetbackSpec {
    pub front: f64,
    pub back: f64,
    pub side: f64,
}

impl SetbackSpec {
    pub fn new(front: f64, back: f64, side: f64) -> Self {
        Self { front: sanitize(front), back: sanitize(back), side: sanitize(side) }
    }

    /// Build from raw text inputs such as form fields
    pub fn from_inputs(front: Option<&str>, back: Option<&str>, side: Option<&str>) -> Self {
        Self::new(parse_distance(front), parse_distance(back), parse_distance(side))
    }

    /// Build from a JSON object with `front`/`back`/`side` keys (numbers or strings)
    pub fn from_json(value: &Value) -> Self {
        let field = |key: &str| match value.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => parse_distance(Some(s)),
            _ => 0.0,
        };
        Self::new(field("front"), field("back"), field("side"))
    }

    /// Setback distance that applies to an edge with the given role
    pub fn for_role(&self, role: EdgeRole) -> f64 {
        match role {
            EdgeRole::Front => self.front,
            EdgeRole::Back => self.back,
            EdgeRole::Side => self.side,
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a setback distance, defaulting to 0 for anything unreadable
pub fn parse_distance(input: Option<&str>) -> f64 {
    input.and_then(|s| s.trim().parse::<f64>().ok()).map(sanitize).unwrap_or(0.0)
}

/// Role of a boundary edge for setback purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRole {
    Front,
    Back,
    #[default]
    Side,
}

impl EdgeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeRole::Front => "front",
            EdgeRole::Back => "back",
            EdgeRole::Side => "side",
        }
    }
}

/// Front/back edge choice for the current boundary
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeSelection {
    pub front: Option<Edge>,
    pub back: Option<Edge>,
}

impl EdgeSelection {
    pub fn is_complete(&self) -> bool {
        self.front.is_some() && self.back.is_some()
    }

    /// Role of the edge at `index` under this selection
    pub fn role_of(&self, index: usize) -> EdgeRole {
        if self.front.is_some_and(|e| e.index == index) {
            EdgeRole::Front
        } else if self.back.is_some_and(|e| e.index == index) {
            EdgeRole::Back
        } else {
            EdgeRole::Side
        }
    }

    /// Selected edge indices in selection order
    pub fn indices(&self) -> Vec<usize> {
        self.front.iter().chain(self.back.iter()).map(|e| e.index).collect()
    }
}

/// Persisted form of an edge selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSelectionRecord {
    #[serde(alias = "selected_edges")]
    pub selected_edges: Vec<usize>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One entry per boundary edge with its role and applicable setback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeClassification {
    pub index: usize,
    #[serde(alias = "type", alias = "classification")]
    pub role: EdgeRole,
    pub setback: f64,
}

/// Map every edge to its role and setback distance
pub fn classify_edges(
    edges: &[Edge],
    selection: &EdgeSelection,
    setbacks: &SetbackSpec,
) -> Vec<EdgeClassification> {
    edges
        .iter()
        .map(|edge| {
            let role = selection.role_of(edge.index);
            EdgeClassification { index: edge.index, role, setback: setbacks.for_role(role) }
        })
        .collect()
}
