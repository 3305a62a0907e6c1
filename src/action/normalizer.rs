use std::sync::LazyLock;

use regex::Regex;

use crate::action::types::{ActionCall, ActionInputs, ActionValue, Factors, ScreenContext};
use crate::geometry::factor::round_half_up;

static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
});

/// How an argument is post-processed, decided once from its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    StartBox,
    EndBox,
    Plain,
}

impl ArgKind {
    pub fn of(key: &str) -> Self {
        if key.contains("start_box") {
            ArgKind::StartBox
        } else if key.contains("end_box") {
            ArgKind::EndBox
        } else {
            ArgKind::Plain
        }
    }

    /// Key receiving the absolute pixel position for box kinds.
    pub fn coords_key(self) -> Option<&'static str> {
        match self {
            ArgKind::StartBox => Some("start_coords"),
            ArgKind::EndBox => Some("end_coords"),
            ArgKind::Plain => None,
        }
    }
}

/// Converts model-space box arguments into normalized fractions and, when the
/// screen is known, absolute pixel positions.
///
/// Denominators are fixed at construction, so every token of one prediction
/// is normalized against the same grid.
#[derive(Debug, Clone)]
pub struct CoordinateNormalizer {
    factors: Factors,
    denominators: Factors,
    screen: Option<ScreenContext>,
    scale_factor: f64,
}

impl CoordinateNormalizer {
    /// `resized` is the smart-resize `(width, height)`; when present it
    /// replaces `factors` as the division grid.
    pub fn new(
        factors: Factors,
        resized: Option<(u32, u32)>,
        screen: Option<ScreenContext>,
        scale_factor: Option<f64>,
    ) -> Self {
        let denominators = resized
            .map(|(w, h)| Factors::new(w as f64, h as f64))
            .unwrap_or(factors);
        Self {
            factors,
            denominators,
            screen: screen.filter(ScreenContext::is_usable),
            scale_factor: scale_factor.unwrap_or(1.0),
        }
    }

    pub fn denominators(&self) -> Factors {
        self.denominators
    }

    pub fn normalize(&self, call: &ActionCall) -> ActionInputs {
        let mut inputs = ActionInputs::new();
        for (key, raw) in &call.args {
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            let key = key.trim();
            let kind = ArgKind::of(key);
            let Some(coords_key) = kind.coords_key() else {
                inputs.insert(key.to_string(), ActionValue::Text(value.to_string()));
                continue;
            };

            let normalized = self.normalize_box(value);
            inputs.insert(key.to_string(), ActionValue::Text(format_number_list(&normalized)));
            if self.screen.is_some() {
                inputs.insert(coords_key.to_string(), ActionValue::Coords(self.absolute(&normalized)));
            }
        }
        inputs
    }

    /// `"(x1,y1,x2,y2)"` → fractions of the grid; a point becomes `[x,y,x,y]`.
    pub fn normalize_box(&self, raw: &str) -> Vec<f64> {
        let cleaned: String = raw.chars().filter(|c| !"()[]".contains(*c)).collect();
        let mut numbers: Vec<f64> = cleaned
            .split(',')
            .filter(|part| !part.is_empty())
            .enumerate()
            .map(|(idx, part)| parse_leading_float(part) / self.denominators.for_index(idx))
            .collect();
        if numbers.len() == 2 {
            numbers.extend_from_within(..);
        }
        numbers
    }

    /// Centroid in screen pixels, or empty when any corner is not a number.
    fn absolute(&self, normalized: &[f64]) -> Vec<f64> {
        let Some(screen) = self.screen else {
            return Vec::new();
        };
        let x1 = normalized.first().copied();
        let y1 = normalized.get(1).copied();
        let x2 = normalized.get(2).copied().or(x1);
        let y2 = normalized.get(3).copied().or(y1);
        let (Some(x1), Some(y1), Some(x2), Some(y2)) = (x1, y1, x2, y2) else {
            return Vec::new();
        };
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            tracing::debug!(?normalized, "non-finite box, coordinates unavailable");
            return Vec::new();
        }

        // Rounds at 1/factor precision before scaling; keep the arithmetic as is.
        let wf = self.factors.width;
        let hf = self.factors.height;
        let x = round_half_up((x1 + x2) / 2.0 * screen.width * wf) / wf * self.scale_factor;
        let y = round_half_up((y1 + y2) / 2.0 * screen.height * hf) / hf * self.scale_factor;
        vec![x, y]
    }
}

/// Parse the leading numeric prefix of `text`; `NaN` when there is none.
pub fn parse_leading_float(text: &str) -> f64 {
    LEADING_NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

/// Serialize as a compact JSON-style list: `[0.1,0.2,0.1,0.2]`, non-finite as `null`.
pub fn format_number_list(numbers: &[f64]) -> String {
    let parts: Vec<String> = numbers
        .iter()
        .map(|n| {
            if !n.is_finite() {
                "null".to_string()
            } else if *n == 0.0 {
                "0".to_string()
            } else {
                n.to_string()
            }
        })
        .collect();
    format!("[{}]", parts.join(","))
}
