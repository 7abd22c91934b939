//! Terminal symbols: one named pattern bound to an action and a set of
//! contexts.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::sync::Arc;

use super::context::ContextId;
use crate::lexer::Action;
use crate::pattern::Ast;

/// Handle returned by [`crate::Grammar::define_symbol`]; equals the symbol's
/// definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A terminal symbol accumulated by the grammar builder.
///
/// `order` is the definition index and doubles as the match priority: when
/// two symbols match the same length at the same position, the lower order
/// wins. `trailing` carries the sign-overloaded raw encoding of the
/// trailing-context split (`> 0`: fixed-length leading part, `<= 0`: fixed
/// trailing part of length `-trailing`); the reader translates it into
/// [`crate::lexer::Trailing`] when the compiled rule is consumed.
pub struct TerminalSymbol {
    pub(crate) id: Option<CompactString>,
    pub(crate) order: u32,
    pub(crate) pattern: Arc<Ast>,
    pub(crate) trailing: Option<i32>,
    pub(crate) action: Action,
    pub(crate) contexts: SmallVec<[ContextId; 2]>,
    /// Set for `<<EOF>>` symbols, which never enter the automaton.
    pub(crate) eof: bool,
}

impl TerminalSymbol {
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn pattern(&self) -> &Ast {
        &self.pattern
    }

    #[must_use]
    pub const fn trailing(&self) -> Option<i32> {
        self.trailing
    }

    #[must_use]
    pub fn contexts(&self) -> &[ContextId] {
        &self.contexts
    }

    #[must_use]
    pub const fn is_eof_rule(&self) -> bool {
        self.eof
    }

    /// Display name for diagnostics: the id when present, `#order` otherwise.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => format!("#{}", self.order),
        }
    }
}

impl std::fmt::Debug for TerminalSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSymbol")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("trailing", &self.trailing)
            .field("contexts", &self.contexts)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}
