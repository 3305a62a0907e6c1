/// Splits raw model text into reflection / thought / action-string.
///
/// Each dialect is an ordered list of capture rules. Adding a dialect means
/// adding a rule table, not another branch inside an existing one.
use std::sync::LazyLock;

use regex::Regex;

use crate::action::types::Dialect;

static ACTION_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Action[:：]").expect("valid action marker regex"));

static O1_THOUGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Thought>\s*(.*?)\s*</Thought>").expect("valid o1 thought regex"));

static O1_SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\nAction_Summary:\s*(.*?)\s*Action:").expect("valid o1 summary regex")
});

static O1_ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\nAction:\s*(.*?)\s*</Output>").expect("valid o1 action regex"));

/// Result of segmenting one prediction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segments {
    pub reflection: Option<String>,
    pub thought: Option<String>,
    pub action_str: String,
}

#[derive(Debug, Default)]
struct Captured {
    reflection: Option<String>,
    thought: Option<String>,
}

/// A `bc` marker rule: the first rule whose trigger holds owns the text,
/// whether or not its capture succeeds.
struct MarkerRule {
    name: &'static str,
    trigger: fn(&str) -> bool,
    capture: fn(&str) -> Option<Captured>,
}

const BC_RULES: &[MarkerRule] = &[
    MarkerRule {
        name: "thought",
        trigger: has_thought,
        capture: capture_thought,
    },
    MarkerRule {
        name: "reflection",
        trigger: starts_with_reflection,
        capture: capture_reflection,
    },
    MarkerRule {
        name: "action_summary",
        trigger: starts_with_summary,
        capture: capture_summary,
    },
];

#[derive(Debug, Clone, Copy)]
enum O1Slot {
    Thought,
    Summary,
    Action,
}

static O1_RULES: [(O1Slot, &LazyLock<Regex>); 3] = [
    (O1Slot::Thought, &O1_THOUGHT_RE),
    (O1Slot::Summary, &O1_SUMMARY_RE),
    (O1Slot::Action, &O1_ACTION_RE),
];

impl Dialect {
    pub fn segment(self, prediction: &str) -> Segments {
        let text = prediction.trim();
        match self {
            Dialect::Bc => segment_bc(text),
            Dialect::O1 => segment_o1(text),
        }
    }
}

fn segment_bc(text: &str) -> Segments {
    let captured = BC_RULES
        .iter()
        .find(|rule| (rule.trigger)(text))
        .and_then(|rule| {
            let captured = (rule.capture)(text);
            tracing::debug!(rule = rule.name, matched = captured.is_some(), "bc marker rule");
            captured
        })
        .unwrap_or_default();

    // Models occasionally drop the `Action:` marker entirely; treat the whole
    // text as actions then.
    let action_str = match ACTION_MARKER_RE.split(text).last() {
        Some(last) if ACTION_MARKER_RE.is_match(text) => last.to_string(),
        _ => text.to_string(),
    };

    Segments {
        reflection: captured.reflection,
        thought: captured.thought,
        action_str,
    }
}

fn segment_o1(text: &str) -> Segments {
    let mut thought = None;
    let mut summary = None;
    let mut action = None;

    for (slot, re) in O1_RULES.iter() {
        let value = re
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
        match slot {
            O1Slot::Thought => thought = value,
            O1Slot::Summary => summary = value,
            O1Slot::Action => action = value,
        }
    }

    tracing::debug!(
        thought = thought.is_some(),
        summary = summary.is_some(),
        action = action.is_some(),
        "o1 segments"
    );

    Segments {
        reflection: None,
        thought: Some(format!(
            "{}\n<Action_Summary>\n{}",
            thought.unwrap_or_default(),
            summary.unwrap_or_default()
        )),
        action_str: action.unwrap_or_default(),
    }
}

fn has_thought(text: &str) -> bool {
    text.contains("Thought:")
}

fn starts_with_reflection(text: &str) -> bool {
    text.starts_with("Reflection:")
}

fn starts_with_summary(text: &str) -> bool {
    text.starts_with("Action_Summary:")
}

/// Text before the first `Action:` / `Action：` marker, trimmed.
fn until_action_marker(text: &str) -> &str {
    match ACTION_MARKER_RE.find(text) {
        Some(m) => text[..m.start()].trim(),
        None => text.trim(),
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn capture_thought(text: &str) -> Option<Captured> {
    let start = text.find("Thought:")? + "Thought:".len();
    Some(Captured {
        reflection: None,
        thought: non_empty(until_action_marker(&text[start..])),
    })
}

fn capture_reflection(text: &str) -> Option<Captured> {
    let rest = text.strip_prefix("Reflection:")?;
    let split = rest.find("Action_Summary:")?;
    let summary = &rest[split + "Action_Summary:".len()..];
    Some(Captured {
        reflection: non_empty(rest[..split].trim()),
        thought: non_empty(until_action_marker(summary)),
    })
}

fn capture_summary(text: &str) -> Option<Captured> {
    let rest = text.strip_prefix("Action_Summary:")?;
    Some(Captured {
        reflection: None,
        thought: non_empty(until_action_marker(rest)),
    })
}

/// Split an action-string into trimmed, non-empty action tokens.
///
/// Only real newlines separate tokens; an escaped `\n` inside a string
/// argument stays part of its token.
pub fn tokenize(action_str: &str) -> Vec<String> {
    action_str
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
