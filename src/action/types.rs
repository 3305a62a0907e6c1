use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Textual convention the model used to separate reasoning from actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `Thought: … Action: …` (optionally `Reflection:` / `Action_Summary:`).
    #[default]
    Bc,
    /// `<Thought>…</Thought>` … `Action: …</Output>`.
    O1,
}

/// Coordinate convention of the model that produced the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelVersion {
    /// Fixed grid: coordinates are fractions of `Factors` (0–1000 by default).
    #[default]
    #[serde(rename = "V1_0")]
    V1_0,
    /// Per-image grid: coordinates are pixels of the smart-resized image.
    #[serde(rename = "V1_5")]
    V1_5,
}

/// Target screen size. Logical sizes on scaled displays may be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenContext {
    pub width: f64,
    pub height: f64,
}

impl ScreenContext {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Only a finite, positive size can place absolute coordinates.
    pub fn is_usable(&self) -> bool {
        [self.width, self.height]
            .iter()
            .all(|side| side.is_finite() && *side > 0.0)
    }
}

/// Denominators the model used when emitting coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Factors {
    pub width: f64,
    pub height: f64,
}

impl Factors {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn uniform(factor: f64) -> Self {
        Self::new(factor, factor)
    }

    /// Denominator for the coordinate at `index` inside a flat `[x, y, x, y]` list.
    pub fn for_index(&self, index: usize) -> f64 {
        if index % 2 == 0 {
            self.width
        } else {
            self.height
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for Factors {
    fn default() -> Self {
        Self::uniform(1000.0)
    }
}

/// A factor as supplied by callers: either one number for both axes or a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactorInput {
    Scalar(f64),
    Pair([f64; 2]),
}

impl From<FactorInput> for Factors {
    fn from(input: FactorInput) -> Self {
        match input {
            FactorInput::Scalar(f) => Factors::uniform(f),
            FactorInput::Pair([w, h]) => Factors::new(w, h),
        }
    }
}

impl Default for FactorInput {
    fn default() -> Self {
        FactorInput::Scalar(1000.0)
    }
}

/// Syntactic result of parsing one action token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionCall {
    pub function_name: String,
    pub args: BTreeMap<String, String>,
}

impl ActionCall {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            args: BTreeMap::new(),
        }
    }
}

/// Value stored under an action input key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    Text(String),
    /// `[x, y]` in absolute pixels, or empty when coordinates are unavailable.
    Coords(Vec<f64>),
}

impl ActionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ActionValue::Text(s) => Some(s),
            ActionValue::Coords(_) => None,
        }
    }

    pub fn as_coords(&self) -> Option<&[f64]> {
        match self {
            ActionValue::Coords(c) => Some(c),
            ActionValue::Text(_) => None,
        }
    }
}

pub type ActionInputs = BTreeMap<String, ActionValue>;

/// One action extracted from a prediction, ready for an executor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedAction {
    pub reflection: Option<String>,
    pub thought: String,
    /// Empty when the token could not be parsed.
    pub action_type: String,
    pub action_inputs: ActionInputs,
}

impl ParsedAction {
    /// Absolute start position, if the screen was known and the box was numeric.
    pub fn start_point(&self) -> Option<(f64, f64)> {
        self.point("start_coords")
    }

    pub fn end_point(&self) -> Option<(f64, f64)> {
        self.point("end_coords")
    }

    pub fn input(&self, key: &str) -> Option<&str> {
        self.action_inputs.get(key).and_then(ActionValue::as_text)
    }

    fn point(&self, key: &str) -> Option<(f64, f64)> {
        match self.action_inputs.get(key)?.as_coords()? {
            [x, y] => Some((*x, *y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_input_accepts_scalar_and_pair() {
        let scalar: FactorInput = serde_json::from_str("1000").unwrap();
        assert_eq!(Factors::from(scalar), Factors::new(1000.0, 1000.0));

        let pair: FactorInput = serde_json::from_str("[1280, 720]").unwrap();
        assert_eq!(Factors::from(pair), Factors::new(1280.0, 720.0));
    }

    #[test]
    fn enums_use_wire_names() {
        assert_eq!(serde_json::to_string(&Dialect::O1).unwrap(), "\"o1\"");
        assert_eq!(serde_json::to_string(&ModelVersion::V1_5).unwrap(), "\"V1_5\"");
        let ver: ModelVersion = serde_json::from_str("\"V1_0\"").unwrap();
        assert_eq!(ver, ModelVersion::V1_0);
    }

    #[test]
    fn action_value_serializes_untagged() {
        let mut inputs = ActionInputs::new();
        inputs.insert("start_box".into(), ActionValue::Text("[0.1,0.2,0.1,0.2]".into()));
        inputs.insert("start_coords".into(), ActionValue::Coords(vec![100.0, 160.0]));
        inputs.insert("end_coords".into(), ActionValue::Coords(vec![]));
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["start_box"], "[0.1,0.2,0.1,0.2]");
        assert_eq!(json["start_coords"], serde_json::json!([100.0, 160.0]));
        assert_eq!(json["end_coords"], serde_json::json!([]));
    }

    #[test]
    fn point_accessors_ignore_empty_coords() {
        let mut action = ParsedAction::default();
        action
            .action_inputs
            .insert("start_coords".into(), ActionValue::Coords(vec![10.0, 20.0]));
        action
            .action_inputs
            .insert("end_coords".into(), ActionValue::Coords(vec![]));
        assert_eq!(action.start_point(), Some((10.0, 20.0)));
        assert_eq!(action.end_point(), None);
    }

    #[test]
    fn zero_factor_is_invalid() {
        assert!(!Factors::new(0.0, 1000.0).is_valid());
        assert!(!Factors::uniform(f64::NAN).is_valid());
        assert!(Factors::default().is_valid());
    }
}
