//! # Grammar Module
//!
//! The symbol and context definition model: a mutable [`Grammar`] builder
//! that accumulates terminal symbols, named sub-patterns and lexer contexts
//! (start conditions), and compiles them on demand into an immutable
//! [`crate::LexerRule`].
//!
//! Symbols are prioritized by definition order: when two symbols match the
//! same length at the same position, the earlier definition wins. Context
//! membership defaults to a snapshot of the inclusive contexts existing at
//! definition time.

mod builder;
mod context;
mod symbol;

pub use builder::{END_OF_FILE, Grammar, INITIAL, PatternSource};
pub use context::{ContextId, ContextKind, LexerContext};
pub use symbol::{SymbolId, TerminalSymbol};
