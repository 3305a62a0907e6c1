use crate::action::types::ActionCall;

/// Strategy trait for turning one action token into an [`ActionCall`].
/// Two implementations: the function-call grammar and a vocabulary heuristic.
/// Strategies never fail loudly; `None` hands the token to the next one.
pub trait ParseStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, token: &str) -> Option<ActionCall>;
}
