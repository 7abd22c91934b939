//! # Sylex
//!
//! A lex-style lexical-analyzer engine: named token patterns bound to
//! semantic actions, optionally scoped to start-condition contexts, compiled
//! into a runtime DFA and driven with longest-match semantics — including
//! patterns with a fixed-length trailing context (lookahead that is matched
//! but not consumed).
//!
//! ## Overview
//!
//! - **[`Grammar`]**: mutable builder accumulating terminal symbols, named
//!   sub-patterns and contexts; compiles lazily into a rule.
//! - **[`LexerRule`]**: the immutable compiled DFA table, shareable across
//!   threads behind an `Arc`.
//! - **[`TokenReader`]**: drives the table over a source string and yields
//!   [`Token`]s; strategies are plain longest-match, trailing-context-aware,
//!   and rejectable.
//!
//! ## Quick Start
//!
//! ```rust
//! use sylex::{Grammar, lexer::action};
//!
//! let mut grammar = Grammar::new();
//! grammar.define_symbol(Some("digits"), "[0-9]+", None, None)?;
//! grammar.define_symbol(Some("plus"), r"\+", None, None)?;
//! grammar.define_symbol(None, r"\s+", Some(action::skip_action()), None)?;
//!
//! let mut reader = grammar.reader("12 + 3")?;
//!
//! let first = reader.read_token().unwrap();
//! assert_eq!(first.id.as_deref(), Some("digits"));
//! assert_eq!(first.text, "12");
//!
//! let second = reader.read_token().unwrap();
//! assert_eq!(second.id.as_deref(), Some("plus"));
//!
//! let third = reader.read_token().unwrap();
//! assert_eq!(third.text, "3");
//!
//! assert!(reader.read_token().unwrap().is_eof());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Contexts (start conditions)
//!
//! Symbols can be scoped to contexts with a `<ctx>` pattern prefix or an
//! explicit context list; actions switch contexts through
//! [`lexer::ReadControl::begin`]. Inclusive contexts inherit symbols defined
//! without an explicit list (snapshot at definition time); exclusive
//! contexts contain only symbols that name them.
//!
//! ## Errors
//!
//! Definition and compilation problems fail fast with named error kinds
//! ([`DefinitionError`], [`CompileError`]). A scan that recognizes nothing
//! is *not* an error: [`TokenReader::read_token`] returns the
//! [`lexer::NoMatch`] value and leaves the position untouched so callers
//! choose their own recovery.

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod pattern;
pub mod text;

pub use error::{CompileError, DefinitionError, PatternError};
pub use grammar::{
    ContextId, ContextKind, END_OF_FILE, Grammar, INITIAL, LexerContext, PatternSource, SymbolId,
    TerminalSymbol,
};
pub use lexer::{
    Action, ActionDecision, Lexeme, LexerRule, NoMatch, Token, TokenReader, Trailing,
};
pub use text::{TextRange, TextSize};
