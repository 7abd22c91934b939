//! The mutable grammar builder.
//!
//! A [`Grammar`] accumulates terminal symbols, named sub-patterns and lexer
//! contexts, and lazily compiles them into an immutable [`LexerRule`] the
//! first time a rule or reader is requested after a change. Definition calls
//! validate their arguments and fail fast; nothing is recorded on failure.

use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::sync::Arc;

use super::context::{ContextId, ContextKind, LexerContext};
use super::symbol::{SymbolId, TerminalSymbol};
use crate::error::{CompileError, DefinitionError};
use crate::lexer::{self, Action, LexerRule, TokenReader, action};
use crate::pattern::{self, Ast, NamedPatterns, fixed_len};

/// Reserved end-of-file marker. Not a legal symbol identifier; as a complete
/// pattern it declares an end-of-file rule for the symbol's contexts.
pub const END_OF_FILE: &str = "<<EOF>>";

/// Label of the inclusive context every grammar starts with.
pub const INITIAL: &str = "INITIAL";

/// A pattern argument: either source text in the mini-syntax or a pre-parsed
/// [`Ast`] stored verbatim.
#[derive(Debug, Clone)]
pub enum PatternSource {
    Text(CompactString),
    Parsed(Arc<Ast>),
}

impl From<&str> for PatternSource {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for PatternSource {
    fn from(text: String) -> Self {
        Self::Text(text.into())
    }
}

impl From<Arc<Ast>> for PatternSource {
    fn from(ast: Arc<Ast>) -> Self {
        Self::Parsed(ast)
    }
}

impl From<Ast> for PatternSource {
    fn from(ast: Ast) -> Self {
        Self::Parsed(Arc::new(ast))
    }
}

enum Body {
    Ast(Arc<Ast>),
    EndOfFile,
}

/// Mutable builder for a lexer grammar.
///
/// Compiled output is cached: repeated [`Grammar::rule`] calls return the
/// same [`Arc`] until the next successful definition marks the grammar
/// dirty. Readers hold their own snapshot and are unaffected by later
/// mutation.
pub struct Grammar {
    symbols: Vec<TerminalSymbol>,
    contexts: Vec<LexerContext>,
    context_index: HashMap<CompactString, ContextId, ahash::RandomState>,
    named: NamedPatterns,
    compiled: Option<Arc<LexerRule>>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    #[must_use]
    pub fn new() -> Self {
        let initial = LexerContext {
            label: INITIAL.into(),
            kind: ContextKind::Inclusive,
            id: ContextId::INITIAL,
        };
        let mut context_index = HashMap::with_hasher(ahash::RandomState::new());
        context_index.insert(initial.label.clone(), initial.id);
        Self {
            symbols: Vec::new(),
            contexts: vec![initial],
            context_index,
            named: NamedPatterns::default(),
            compiled: None,
        }
    }

    /// Define a terminal symbol.
    ///
    /// A textual pattern may start with a `<ctx1,ctx2,...>` or `<*>` context
    /// prefix (`<*>` means every inclusive context); the literal `<<EOF>>`
    /// is exempt from prefix parsing. Prefix contexts and the explicit
    /// `contexts` argument are unioned; when neither is given the symbol
    /// joins every inclusive context existing *now* — a context defined
    /// later does not pick it up.
    ///
    /// Without an `action` the default emit action is used.
    ///
    /// # Errors
    ///
    /// Fails fast with a [`DefinitionError`] on an invalid identifier, a
    /// malformed context prefix, an unknown context label, or a malformed
    /// pattern. The grammar is unchanged on failure.
    pub fn define_symbol(
        &mut self,
        id: Option<&str>,
        pattern: impl Into<PatternSource>,
        action: Option<Action>,
        contexts: Option<&[&str]>,
    ) -> Result<SymbolId, DefinitionError> {
        if let Some(name) = id {
            self.validate_identifier(name)?;
        }

        let (mut symbol_contexts, body) = match pattern.into() {
            PatternSource::Parsed(ast) => (SmallVec::new(), Body::Ast(ast)),
            PatternSource::Text(text) => self.parse_pattern_text(&text)?,
        };

        if let Some(labels) = contexts {
            for label in labels {
                let ctx = self
                    .context(label)
                    .ok_or_else(|| DefinitionError::UnknownContext {
                        label: (*label).to_string(),
                    })?;
                if !symbol_contexts.contains(&ctx) {
                    symbol_contexts.push(ctx);
                }
            }
        }
        if symbol_contexts.is_empty() {
            // Snapshot of the current inclusive contexts, not a live set:
            // contexts created afterwards do not include this symbol.
            symbol_contexts = self.inclusive_snapshot();
        }

        let (ast, trailing, eof) = match body {
            Body::EndOfFile => (Arc::new(Ast::Empty), None, true),
            Body::Ast(ast) => {
                let trailing = match &*ast {
                    Ast::Trailing { body, look } => {
                        match (fixed_len(look), fixed_len(body)) {
                            // A fixed-length lookahead is encoded negatively
                            // (including length zero); a fixed-length leading
                            // part is only used when the lookahead varies.
                            (Some(m), _) => Some(-i32::try_from(m).unwrap_or(i32::MAX)),
                            (None, Some(n)) => Some(i32::try_from(n).unwrap_or(i32::MAX)),
                            (None, None) => None,
                        }
                    }
                    _ => None,
                };
                (ast, trailing, false)
            }
        };

        let order = u32::try_from(self.symbols.len()).unwrap_or(u32::MAX);
        self.symbols.push(TerminalSymbol {
            id: id.map(CompactString::from),
            order,
            pattern: ast,
            trailing,
            action: action.unwrap_or_else(action::default_action),
            contexts: symbol_contexts,
            eof,
        });
        self.compiled = None;
        Ok(SymbolId(order))
    }

    /// Define a named sub-pattern usable as `{name}` in later patterns.
    ///
    /// A pre-parsed pattern is stored verbatim; a string is parsed against
    /// the named patterns defined so far (single forward pass — later names
    /// may reference earlier ones, never the reverse).
    ///
    /// # Errors
    ///
    /// Fails with a [`DefinitionError`] on an invalid name or a malformed
    /// pattern; trailing context is rejected inside named sub-patterns.
    pub fn define_regex(
        &mut self,
        name: &str,
        pattern: impl Into<PatternSource>,
    ) -> Result<(), DefinitionError> {
        self.validate_identifier(name)?;
        let ast = match pattern.into() {
            PatternSource::Parsed(ast) => ast,
            PatternSource::Text(text) => {
                if text.is_empty() {
                    return Err(DefinitionError::MissingPattern);
                }
                Arc::new(pattern::parse(&text, &self.named, false)?)
            }
        };
        self.named.insert(name.into(), ast);
        self.compiled = None;
        Ok(())
    }

    /// Define an exclusive context (a closed start condition: only symbols
    /// that name it are active in it).
    ///
    /// # Errors
    ///
    /// Fails with a [`DefinitionError`] on an invalid or already-used label.
    pub fn define_context(&mut self, label: &str) -> Result<ContextId, DefinitionError> {
        self.add_context(label, ContextKind::Exclusive)
    }

    /// Define an inclusive context: symbols defined *afterwards* without an
    /// explicit context list join it automatically.
    ///
    /// # Errors
    ///
    /// Fails with a [`DefinitionError`] on an invalid or already-used label.
    pub fn define_inclusive_context(
        &mut self,
        label: &str,
    ) -> Result<ContextId, DefinitionError> {
        self.add_context(label, ContextKind::Inclusive)
    }

    /// The compiled rule for the current grammar, rebuilding it only when a
    /// definition has happened since the last compilation.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if the automaton cannot be constructed;
    /// no reader can exist for a grammar that fails here.
    pub fn rule(&mut self) -> Result<Arc<LexerRule>, CompileError> {
        if let Some(rule) = &self.compiled {
            return Ok(Arc::clone(rule));
        }
        let rule = Arc::new(lexer::compile(&self.symbols, &self.contexts)?);
        self.compiled = Some(Arc::clone(&rule));
        Ok(rule)
    }

    /// A longest-match reader over `source`, upgraded to trailing-context
    /// bookkeeping automatically when the grammar uses `/` patterns.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if compilation fails.
    pub fn reader<'s>(&mut self, source: &'s str) -> Result<TokenReader<'s>, CompileError> {
        Ok(self.rule()?.reader(source))
    }

    /// A reader whose actions may additionally return
    /// [`crate::ActionDecision::Reject`] to fall back to the next-best
    /// match candidate from the same scan.
    ///
    /// # Errors
    ///
    /// Returns a [`CompileError`] if compilation fails.
    pub fn rejectable_reader<'s>(
        &mut self,
        source: &'s str,
    ) -> Result<TokenReader<'s>, CompileError> {
        Ok(self.rule()?.rejectable_reader(source))
    }

    /// Look up a context by label.
    #[must_use]
    pub fn context(&self, label: &str) -> Option<ContextId> {
        self.context_index.get(label).copied()
    }

    #[must_use]
    pub fn contexts(&self) -> &[LexerContext] {
        &self.contexts
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> Option<&TerminalSymbol> {
        self.symbols.get(id.index())
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    fn add_context(
        &mut self,
        label: &str,
        kind: ContextKind,
    ) -> Result<ContextId, DefinitionError> {
        self.validate_identifier(label)?;
        if label.contains(['<', '>', ',', '*']) {
            return Err(DefinitionError::InvalidIdentifier {
                id: label.to_string(),
            });
        }
        if self.context_index.contains_key(label) {
            return Err(DefinitionError::DuplicateContext {
                label: label.to_string(),
            });
        }
        let id = ContextId(u32::try_from(self.contexts.len()).unwrap_or(u32::MAX));
        let context = LexerContext {
            label: label.into(),
            kind,
            id,
        };
        self.context_index.insert(context.label.clone(), id);
        self.contexts.push(context);
        self.compiled = None;
        Ok(id)
    }

    fn validate_identifier(&self, id: &str) -> Result<(), DefinitionError> {
        if id.is_empty() || id.contains(char::is_whitespace) || id == END_OF_FILE {
            return Err(DefinitionError::InvalidIdentifier { id: id.to_string() });
        }
        Ok(())
    }

    fn inclusive_snapshot(&self) -> SmallVec<[ContextId; 2]> {
        self.contexts
            .iter()
            .filter(|c| c.is_inclusive())
            .map(LexerContext::id)
            .collect()
    }

    /// Split an optional `<...>` context prefix off `text` and parse the
    /// remainder. `<<EOF>>` never participates in prefix parsing.
    fn parse_pattern_text(
        &self,
        text: &str,
    ) -> Result<(SmallVec<[ContextId; 2]>, Body), DefinitionError> {
        let mut contexts: SmallVec<[ContextId; 2]> = SmallVec::new();
        let mut rest = text;

        if rest.starts_with('<') && !rest.starts_with("<<") {
            let Some(close) = rest.find('>') else {
                return Err(DefinitionError::IncompleteContext {
                    pattern: text.to_string(),
                });
            };
            let inner = &rest[1..close];
            rest = &rest[close + 1..];
            if inner == "*" {
                contexts = self.inclusive_snapshot();
            } else {
                for label in inner.split(',') {
                    let ctx = self.context(label).ok_or_else(|| {
                        DefinitionError::UnknownContext {
                            label: label.to_string(),
                        }
                    })?;
                    if !contexts.contains(&ctx) {
                        contexts.push(ctx);
                    }
                }
            }
        }

        if rest.is_empty() {
            return Err(DefinitionError::MissingPattern);
        }
        if rest == END_OF_FILE {
            return Ok((contexts, Body::EndOfFile));
        }
        let ast = pattern::parse(rest, &self.named, true)?;
        Ok((contexts, Body::Ast(Arc::new(ast))))
    }
}
