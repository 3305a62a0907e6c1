pub mod call_parser;
pub mod normalizer;
pub mod pipeline;
pub mod segmenter;
pub mod traits;
pub mod types;

pub use call_parser::{parse_action, ActionCallParser, GrammarStrategy, HeuristicStrategy};
pub use pipeline::{action_parser, action_parser_with, parse_action_vlm, ParseOutput, ParseRequest};
pub use types::*;
