//! Error types for grammar definition and rule compilation.
//!
//! Definition-time and compile-time contract violations are distinct, named
//! error kinds that fail fast. A scan that recognizes no token is *not* an
//! error: it is surfaced as the [`crate::lexer::NoMatch`] value so callers
//! can pick their own recovery policy.

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Errors raised immediately by [`crate::Grammar`] definition calls, before
/// any compilation happens. Nothing is recorded in the grammar when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum DefinitionError {
    #[error(
        "invalid identifier {id:?}: identifiers must be non-empty, free of whitespace, \
         and must not be the reserved end-of-file marker"
    )]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::invalid_identifier)))]
    InvalidIdentifier { id: String },

    #[error("context prefix of pattern {pattern:?} is missing its closing '>'")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::incomplete_context)))]
    IncompleteContext { pattern: String },

    #[error("unknown lexer context {label:?}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::unknown_context)))]
    UnknownContext { label: String },

    #[error("lexer context {label:?} is already defined")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::duplicate_context)))]
    DuplicateContext { label: String },

    #[error("a non-empty pattern is required")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::missing_pattern)))]
    MissingPattern,

    #[error("malformed pattern")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::malformed_pattern)))]
    Pattern(#[from] PatternError),
}

/// A fault in a pattern string, with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("{kind} at offset {offset}")]
pub struct PatternError {
    pub offset: usize,
    #[source]
    pub kind: PatternErrorKind,
}

impl PatternError {
    #[must_use]
    pub const fn new(offset: usize, kind: PatternErrorKind) -> Self {
        Self { offset, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum PatternErrorKind {
    #[error("unbalanced group")]
    UnbalancedGroup,

    #[error("unterminated character class")]
    UnterminatedClass,

    #[error("invalid character range in class")]
    InvalidClassRange,

    #[error("unterminated quoted literal")]
    UnterminatedQuote,

    #[error("invalid escape sequence '\\{escape}'")]
    InvalidEscape { escape: char },

    #[error("invalid repetition bounds")]
    InvalidRepetition,

    #[error("repetition operator with nothing to repeat")]
    DanglingRepetition,

    #[error("unterminated named-pattern reference")]
    UnterminatedName,

    #[error("unknown named pattern {name:?}")]
    UnknownNamedPattern { name: String },

    #[error("only one '/' trailing-context operator is allowed")]
    DuplicateTrailing,

    #[error("trailing context is not allowed in named sub-patterns")]
    TrailingNotAllowed,

    #[error("unexpected character {ch:?}")]
    UnexpectedChar { ch: char },

    #[error("unexpected end of pattern")]
    UnexpectedEnd,
}

/// Errors from compiling the accumulated grammar into a [`crate::LexerRule`].
///
/// Compilation either succeeds and yields a valid, immutable table, or fails
/// here before any reader can be created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum CompileError {
    #[error(
        "trailing context of symbol {symbol} has no fixed-length side; \
         either the leading or the trailing part must have a fixed length"
    )]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sylex::variable_trailing_context)))]
    VariableTrailingContext { symbol: String },
}
