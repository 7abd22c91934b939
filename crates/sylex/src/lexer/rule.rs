//! The compiled lexer rule: an immutable DFA table plus per-symbol metadata.
//!
//! Produced once per grammar version and safely shared (read-only) by any
//! number of readers on independent threads.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::sync::Arc;

use super::action::Action;
use super::reader::{ReaderStrategy, TokenReader};
use crate::grammar::{ContextId, ContextKind};

/// State index in the DFA. u32 is sufficient for all practical table sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateId(pub(crate) u32);

impl StateId {
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One DFA state: disjoint, sorted transition ranges and the accepting
/// symbol indices ordered by priority (ascending definition order; synthetic
/// trailing markers sort after every real symbol).
#[derive(Debug, Clone, Default)]
pub(crate) struct DfaState {
    /// `(lo, hi, target)`: inclusive codepoint ranges, disjoint and sorted
    /// by `lo` for binary search.
    pub(crate) transitions: Vec<(u32, u32, StateId)>,
    pub(crate) accepting: SmallVec<[u32; 2]>,
}

impl DfaState {
    /// Binary search the sorted ranges for the one containing `c`.
    pub(crate) fn transition(&self, c: char) -> Option<StateId> {
        let cp = c as u32;
        self.transitions
            .binary_search_by(|&(lo, hi, _)| {
                if cp < lo {
                    std::cmp::Ordering::Greater
                } else if cp > hi {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .ok()
            .map(|idx| self.transitions[idx].2)
    }
}

/// Per-symbol metadata carried by the compiled rule.
pub(crate) struct SymbolMeta {
    pub(crate) id: Option<CompactString>,
    pub(crate) order: u32,
    /// Raw sign-overloaded trailing value; translated to [`Trailing`] at the
    /// point of consumption.
    pub(crate) trailing: Option<i32>,
    pub(crate) action: Action,
}

/// Explicit form of the sign-overloaded trailing value.
///
/// The raw encoding conflates two meanings: a positive value is the fixed
/// length of the *leading* part, anything else is the negated fixed length
/// of the *trailing* part. The translation keeps the strict `> 0` test, so
/// a raw value of exactly `0` lands in `FixedTail(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailing {
    /// No trailing context.
    None,
    /// The leading part has this fixed length; everything matched beyond it
    /// was lookahead.
    FixedLead(u32),
    /// The lookahead has this fixed length and is trimmed off the end of
    /// the match.
    FixedTail(u32),
}

impl Trailing {
    #[must_use]
    pub(crate) fn from_raw(raw: Option<i32>) -> Self {
        match raw {
            None => Self::None,
            Some(t) if t > 0 => Self::FixedLead(t.unsigned_abs()),
            Some(t) => Self::FixedTail(t.unsigned_abs()),
        }
    }
}

/// The immutable compiled lexer rule.
///
/// The reader consumes this purely as a read-only table: transitions,
/// per-state accepting lists, per-symbol trailing/action metadata, and the
/// boundary `symbols.len()` separating real symbols from synthetic trailing
/// markers. Construction happens in [`Grammar::rule`](crate::Grammar::rule).
pub struct LexerRule {
    pub(crate) states: Vec<DfaState>,
    /// Designated start state per context.
    pub(crate) start_states: Vec<StateId>,
    pub(crate) symbols: Vec<SymbolMeta>,
    pub(crate) marker_count: u32,
    pub(crate) contexts: Vec<(CompactString, ContextKind)>,
    /// End-of-file symbol per context, when declared.
    pub(crate) eof_symbols: Vec<Option<u32>>,
}

impl LexerRule {
    /// Number of real symbols; accepting indices at or above this boundary
    /// are synthetic trailing markers and never yield tokens.
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Number of synthetic trailing-context markers in the table.
    #[must_use]
    pub const fn marker_count(&self) -> u32 {
        self.marker_count
    }

    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Look up a context by label.
    #[must_use]
    pub fn context(&self, label: &str) -> Option<ContextId> {
        self.contexts
            .iter()
            .position(|(l, _)| l == label)
            .map(|i| ContextId(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Whether any symbol carries a trailing-context value.
    #[must_use]
    pub fn has_trailing(&self) -> bool {
        self.symbols.iter().any(|s| s.trailing.is_some())
    }

    /// A longest-match reader over `source` bound to this rule, with
    /// trailing-context bookkeeping when the rule needs it. Clone the `Arc`
    /// to keep a handle or to serve several readers.
    #[must_use]
    pub fn reader<'s>(self: Arc<Self>, source: &'s str) -> TokenReader<'s> {
        let strategy = if self.has_trailing() {
            ReaderStrategy::TrailingContext
        } else {
            ReaderStrategy::LongestMatch
        };
        TokenReader::new(self, source, strategy)
    }

    /// A reader honoring [`crate::ActionDecision::Reject`].
    #[must_use]
    pub fn rejectable_reader<'s>(self: Arc<Self>, source: &'s str) -> TokenReader<'s> {
        TokenReader::new(self, source, ReaderStrategy::Rejectable)
    }

    pub(crate) fn start_state(&self, context: ContextId) -> StateId {
        self.start_states[context.index()]
    }

    pub(crate) fn state(&self, id: StateId) -> &DfaState {
        &self.states[id.index()]
    }

    pub(crate) fn eof_symbol(&self, context: ContextId) -> Option<u32> {
        self.eof_symbols[context.index()]
    }

    pub(crate) fn is_real(&self, accepting_index: u32) -> bool {
        (accepting_index as usize) < self.symbols.len()
    }
}
