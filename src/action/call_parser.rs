//! Action call parser: one token in, `(function, args)` out.
//!
//! Tokens are first canonicalized (box markers stripped, `point` spellings
//! folded into `start_box` / `end_box`), then run through an ordered chain of
//! [`ParseStrategy`] implementations. The first strategy that returns a call
//! wins; if none does, the token is reported and `None` is returned.
use std::sync::LazyLock;

use regex::Regex;

use crate::action::traits::ParseStrategy;
use crate::action::types::ActionCall;

static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("valid call regex"));

// A single-quoted run is atomic, so commas inside quotes do not split.
static ARG_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^,']|'[^']*')+").expect("valid arg group regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static COORD_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(\[{]\s*(-?\d+(?:\.\d+)?)\s*,\s*(-?\d+(?:\.\d+)?)\s*[)\]}]")
        .expect("valid coordinate pair regex")
});

static LABELLED_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:text|value|input)["']?\s*[:=]\s*(?:"([^"]*)"|'([^']*)'|([^\s,;)}\]]+))"#)
        .expect("valid labelled text regex")
});

static BARE_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\btype\s+(?:"([^"]*)"|'([^']*)'|(.+))"#).expect("valid bare type regex")
});

/// Actions the heuristic recognizes, in priority order.
pub const ACTION_VOCABULARY: &[&str] = &[
    "click",
    "type",
    "drag",
    "scroll",
    "wait",
    "hover",
    "finished",
    "call_user",
];

const BOX_MARKERS: &[&str] = &["<|box_start|>", "<|box_end|>"];

/// Inline coordinate tags some checkpoints emit inside argument values.
const COORD_TAGS: &[(&str, &str)] = &[("<bbox>", "</bbox>"), ("<point>", "</point>")];

// ── Preprocessing ────────────────────────────────────────────────────────────

/// Strip box markers and fold `point=` spellings into `start_box=` / `end_box=`.
pub fn canonicalize(token: &str) -> String {
    let mut stripped = token.to_string();
    for marker in BOX_MARKERS {
        stripped = stripped.replace(marker, "");
    }
    fold_point_args(&stripped)
}

fn fold_point_args(text: &str) -> String {
    const POINT: &str = "point=";
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;
    while let Some(idx) = rest.find(POINT) {
        let head = &rest[..idx];
        if let Some(prefix) = head.strip_suffix("start_") {
            out.push_str(prefix);
            out.push_str("start_box=");
        } else if let Some(prefix) = head.strip_suffix("end_") {
            out.push_str(prefix);
            out.push_str("end_box=");
        } else {
            out.push_str(head);
            out.push_str("start_box=");
        }
        rest = &rest[idx + POINT.len()..];
    }
    out.push_str(rest);
    out
}

// ── Grammar strategy ─────────────────────────────────────────────────────────

/// `name(key='value', other="value")`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrammarStrategy;

impl ParseStrategy for GrammarStrategy {
    fn name(&self) -> &'static str {
        "grammar"
    }

    fn parse(&self, token: &str) -> Option<ActionCall> {
        let caps = CALL_RE.captures(token.trim())?;
        let mut call = ActionCall::new(&caps[1]);
        let args = &caps[2];
        if args.trim().is_empty() {
            return Some(call);
        }

        for group in ARG_GROUP_RE.find_iter(args) {
            let (key, raw) = group.as_str().split_once('=').unwrap_or((group.as_str(), ""));
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            call.args.insert(key.to_string(), clean_value(raw));
        }
        Some(call)
    }
}

/// Trim, drop one layer of quotes, and rewrite inline coordinate tags as `(a,b,…)`.
fn clean_value(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix(['\'', '"'])
        .unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix(['\'', '"']).unwrap_or(unquoted);

    let mut value = unquoted.to_string();
    for (open, close) in COORD_TAGS {
        if value.contains(open) {
            let inner = value.replace(open, "").replace(close, "");
            value = format!("({})", WHITESPACE_RE.replace_all(inner.trim(), ","));
        }
    }
    value
}

// ── Heuristic strategy ───────────────────────────────────────────────────────

/// Best-effort extraction from free text or JSON-ish output that does not
/// follow the call grammar.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStrategy;

impl ParseStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn parse(&self, token: &str) -> Option<ActionCall> {
        let lowered = token.to_lowercase();
        let action = ACTION_VOCABULARY
            .iter()
            .find(|word| lowered.contains(*word))?;

        let mut call = ActionCall::new(*action);
        if let Some(caps) = COORD_PAIR_RE.captures(token) {
            call.args
                .insert("start_box".into(), format!("({},{})", &caps[1], &caps[2]));
        }
        if *action == "type" {
            if let Some(content) = extract_typed_text(token) {
                call.args.insert("content".into(), content);
            }
        }
        Some(call)
    }
}

fn extract_typed_text(token: &str) -> Option<String> {
    [&*LABELLED_TEXT_RE, &*BARE_TYPE_RE].iter().find_map(|re| {
        let caps = re.captures(token)?;
        (1..=3)
            .find_map(|i| caps.get(i))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

// ── Chain ────────────────────────────────────────────────────────────────────

/// Ordered fallback chain of parse strategies.
pub struct ActionCallParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl ActionCallParser {
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn parse(&self, token: &str) -> Option<ActionCall> {
        let prepared = canonicalize(token);
        for strategy in &self.strategies {
            if let Some(call) = strategy.parse(&prepared) {
                tracing::debug!(
                    strategy = strategy.name(),
                    function = %call.function_name,
                    args = call.args.len(),
                    "action token parsed"
                );
                return Some(call);
            }
        }
        tracing::warn!(token = %token, "unparsable action token");
        None
    }
}

impl Default for ActionCallParser {
    fn default() -> Self {
        Self::new(vec![Box::new(GrammarStrategy), Box::new(HeuristicStrategy)])
    }
}

static DEFAULT_PARSER: LazyLock<ActionCallParser> = LazyLock::new(ActionCallParser::default);

/// Parse one token with the default grammar → heuristic chain.
pub fn parse_action(token: &str) -> Option<ActionCall> {
    DEFAULT_PARSER.parse(token)
}
