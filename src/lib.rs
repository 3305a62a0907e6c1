//! Turns raw vision-language model output into executable GUI actions.
//!
//! The model client hands over the text it received; [`action_parser`] returns
//! the ordered actions with coordinates normalized to the model grid and,
//! when the screen size is known, resolved to absolute pixels.
pub mod action;
pub mod config;
pub mod errors;
pub mod geometry;

pub use action::{
    action_parser, action_parser_with, parse_action, parse_action_vlm, ActionCall, ActionInputs,
    ActionValue, Dialect, FactorInput, Factors, ModelVersion, ParseOutput, ParseRequest,
    ParsedAction, ScreenContext,
};
pub use config::ParserConfig;
pub use errors::{ParserError, ParserResult};
pub use geometry::{smart_resize, SmartResizeParams};
