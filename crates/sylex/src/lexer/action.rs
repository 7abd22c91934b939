//! Semantic actions bound to terminal symbols.
//!
//! An action runs after a match is resolved and trimmed, and decides what
//! the reader does next. The default action emits the token unchanged;
//! whitespace and comment symbols typically use [`skip`]. Actions are shared
//! `Arc` callbacks so a compiled rule can cross threads.

use std::sync::Arc;

use super::reader::ReadControl;
use crate::text::TextRange;

/// Callback invoked with the trimmed match. Faults raised inside an action
/// (panics) propagate to the `read_token` caller unmodified.
pub type Action =
    Arc<dyn Fn(&Lexeme<'_>, &mut ReadControl<'_>) -> ActionDecision + Send + Sync>;

/// What the reader does with a resolved match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionDecision {
    /// Produce the token.
    Emit,
    /// Produce no token and start a new scan at the current position
    /// (whitespace / comment idiom).
    Skip,
    /// Pretend this symbol never matched and fall back to the next-best
    /// candidate of the same scan. Only meaningful with a rejectable
    /// reader; other readers treat it as [`ActionDecision::Skip`].
    Reject,
}

/// The resolved, trimmed match an action is invoked with.
#[derive(Debug, Clone, Copy)]
pub struct Lexeme<'a> {
    /// Matched text after trailing-context trimming.
    pub text: &'a str,
    /// Byte range of `text` in the source.
    pub range: TextRange,
    /// The symbol's display id, when it has one.
    pub id: Option<&'a str>,
    /// The symbol's definition order.
    pub order: u32,
}

/// The default action: emit the token unchanged.
pub fn emit(_: &Lexeme<'_>, _: &mut ReadControl<'_>) -> ActionDecision {
    ActionDecision::Emit
}

/// Discard the match and keep scanning.
pub fn skip(_: &Lexeme<'_>, _: &mut ReadControl<'_>) -> ActionDecision {
    ActionDecision::Skip
}

/// Wrap a closure as a shareable [`Action`].
pub fn wrap(
    f: impl Fn(&Lexeme<'_>, &mut ReadControl<'_>) -> ActionDecision + Send + Sync + 'static,
) -> Action {
    Arc::new(f)
}

/// [`emit`] as a ready-made [`Action`].
#[must_use]
pub fn emit_action() -> Action {
    Arc::new(emit)
}

/// [`skip`] as a ready-made [`Action`].
#[must_use]
pub fn skip_action() -> Action {
    Arc::new(skip)
}

pub(crate) fn default_action() -> Action {
    Arc::new(emit)
}
