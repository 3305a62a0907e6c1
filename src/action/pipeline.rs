//! End-to-end pipeline: raw prediction text → ordered list of parsed actions.
//!
//! 1. Validate the numeric configuration (the only thing that can fail).
//! 2. Resolve the coordinate grid once: smart-resize for V1_5 with a known
//!    screen, otherwise the supplied factors.
//! 3. Segment the prediction per dialect and tokenize the action-string.
//! 4. Parse and normalize every token; unparsable tokens become empty actions.
use serde::{Deserialize, Serialize};

use crate::action::call_parser::parse_action;
use crate::action::normalizer::CoordinateNormalizer;
use crate::action::segmenter::tokenize;
use crate::action::types::{
    ActionInputs, Dialect, FactorInput, Factors, ModelVersion, ParsedAction, ScreenContext,
};
use crate::errors::{ParserError, ParserResult};
use crate::geometry::{smart_resize, SmartResizeParams};

/// Input of [`action_parser`], shaped like the JSON the model client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub prediction: String,
    #[serde(default)]
    pub factor: FactorInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_context: Option<ScreenContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
    #[serde(default)]
    pub mode: Dialect,
    #[serde(default)]
    pub model_ver: ModelVersion,
    /// Overrides the smart-resize pixel budget for this call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pixels: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pixels: Option<u64>,
}

impl ParseRequest {
    pub fn new(prediction: impl Into<String>) -> Self {
        Self {
            prediction: prediction.into(),
            factor: FactorInput::default(),
            screen_context: None,
            scale_factor: None,
            mode: Dialect::default(),
            model_ver: ModelVersion::default(),
            max_pixels: None,
            min_pixels: None,
        }
    }

    pub fn factor(mut self, factor: FactorInput) -> Self {
        self.factor = factor;
        self
    }

    pub fn screen(mut self, width: u32, height: u32) -> Self {
        self.screen_context = Some(ScreenContext::new(f64::from(width), f64::from(height)));
        self
    }

    pub fn scale_factor(mut self, scale: f64) -> Self {
        self.scale_factor = Some(scale);
        self
    }

    pub fn mode(mut self, mode: Dialect) -> Self {
        self.mode = mode;
        self
    }

    pub fn model_ver(mut self, ver: ModelVersion) -> Self {
        self.model_ver = ver;
        self
    }

    fn resize_params(&self, base: &SmartResizeParams) -> SmartResizeParams {
        SmartResizeParams {
            max_pixels: self.max_pixels.unwrap_or(base.max_pixels),
            min_pixels: self.min_pixels.unwrap_or(base.min_pixels),
            ..*base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParseOutput {
    pub parsed: Vec<ParsedAction>,
}

/// Parse a request with the built-in smart-resize defaults.
pub fn action_parser(request: &ParseRequest) -> ParserResult<ParseOutput> {
    action_parser_with(request, &SmartResizeParams::default())
}

/// Parse a request, using `resize` as the base smart-resize configuration.
pub fn action_parser_with(
    request: &ParseRequest,
    resize: &SmartResizeParams,
) -> ParserResult<ParseOutput> {
    let parsed = parse_action_vlm(
        &request.prediction,
        request.factor.into(),
        request.mode,
        request.screen_context,
        request.scale_factor,
        request.model_ver,
        &request.resize_params(resize),
    )?;
    Ok(ParseOutput { parsed })
}

/// Core pipeline. Errors only on invalid configuration; any model text,
/// however malformed, yields a (possibly empty) list.
pub fn parse_action_vlm(
    prediction: &str,
    factors: Factors,
    mode: Dialect,
    screen: Option<ScreenContext>,
    scale_factor: Option<f64>,
    model_ver: ModelVersion,
    resize: &SmartResizeParams,
) -> ParserResult<Vec<ParsedAction>> {
    if !factors.is_valid() {
        return Err(ParserError::InvalidConfig(format!(
            "factors must be positive finite numbers, got ({}, {})",
            factors.width, factors.height
        )));
    }
    if let Some(scale) = scale_factor {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ParserError::InvalidConfig(format!(
                "scale factor must be a positive finite number, got {scale}"
            )));
        }
    }
    resize.validate()?;

    let resized = match (model_ver, screen) {
        (ModelVersion::V1_5, Some(s)) if s.is_usable() => smart_resize(s.height, s.width, resize),
        _ => None,
    };
    let normalizer = CoordinateNormalizer::new(factors, resized, screen, scale_factor);
    tracing::debug!(
        ?model_ver,
        ?mode,
        denominators = ?normalizer.denominators(),
        "coordinate grid resolved"
    );

    let segments = mode.segment(prediction);
    let thought = segments.thought.unwrap_or_default();
    let reflection = segments.reflection;

    let actions: Vec<ParsedAction> = tokenize(&segments.action_str)
        .iter()
        .map(|token| {
            let (action_type, action_inputs) = match parse_action(token) {
                Some(call) => {
                    let inputs = normalizer.normalize(&call);
                    (call.function_name, inputs)
                }
                None => (String::new(), ActionInputs::new()),
            };
            ParsedAction {
                reflection: reflection.clone(),
                thought: thought.clone(),
                action_type,
                action_inputs,
            }
        })
        .collect();

    tracing::debug!(count = actions.len(), "prediction parsed");
    Ok(actions)
}
