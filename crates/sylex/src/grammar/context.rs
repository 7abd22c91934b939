//! Lexer contexts (start conditions, as in classic lex).

use compact_str::CompactString;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Index of a context in its grammar. `ContextId::INITIAL` always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u32);

impl ContextId {
    /// The always-present inclusive start condition.
    pub const INITIAL: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a context acquires symbols.
///
/// Inclusive contexts inherit every symbol defined without an explicit
/// context list (at the moment of that symbol's definition); exclusive
/// contexts only contain symbols that name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ContextKind {
    Inclusive,
    Exclusive,
}

/// A named lexing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerContext {
    pub(crate) label: CompactString,
    pub(crate) kind: ContextKind,
    pub(crate) id: ContextId,
}

impl LexerContext {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn kind(&self) -> ContextKind {
        self.kind
    }

    #[must_use]
    pub const fn id(&self) -> ContextId {
        self.id
    }

    #[must_use]
    pub fn is_inclusive(&self) -> bool {
        self.kind == ContextKind::Inclusive
    }
}
