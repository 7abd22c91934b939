//! The token reader engine: a state machine over the compiled DFA with
//! longest-match semantics, trailing-context rewind arithmetic, and an
//! optional reject-and-fall-back strategy.
//!
//! Scanning never backtracks into the source; only position bookkeeping is
//! rewound. A scan that recognizes nothing leaves the position at the scan
//! start and returns the [`NoMatch`] value — recovery policy belongs to the
//! caller (see [`TokenReader::bump`]).

use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

use super::action::{ActionDecision, Lexeme};
use super::rule::{LexerRule, Trailing};
use super::token::Token;
use crate::grammar::ContextId;
use crate::text::{TextRange, TextSize};

/// No symbol of the active context matches at the current position.
///
/// This is a normal, recoverable outcome of tokenizing malformed input, not
/// a fault: the stream position is left at the scan start so the caller can
/// decide whether to stop or to skip a character and retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no symbol matches the input at byte offset {at}")]
pub struct NoMatch {
    /// Position the failed scan started at (and the stream is still at).
    pub at: TextSize,
    /// The context that was active during the scan.
    pub context: ContextId,
}

/// Matching strategy, fixed at reader construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderStrategy {
    /// Plain longest match; no trailing-context bookkeeping.
    LongestMatch,
    /// Longest match plus the per-character offset journal needed to trim
    /// fixed-length trailing context.
    TrailingContext,
    /// Retains every accepting candidate of a scan so actions may
    /// [`ActionDecision::Reject`] their own match.
    Rejectable,
}

/// Handed to actions; lets them switch the active context.
pub struct ReadControl<'r> {
    rule: &'r LexerRule,
    current: ContextId,
    requested: Option<ContextId>,
}

impl ReadControl<'_> {
    /// The context the next scan will run in.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.requested.unwrap_or(self.current)
    }

    /// Switch to the context with the given label. Returns false (and
    /// changes nothing) when no such context exists.
    pub fn begin(&mut self, label: &str) -> bool {
        match self.rule.context(label) {
            Some(id) => {
                self.requested = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn set_context(&mut self, context: ContextId) {
        self.requested = Some(context);
    }
}

enum ScanOutcome {
    Token(Token),
    Skip,
    NoMatch,
}

enum CandidateOutcome {
    Done(ScanOutcome),
    Rejected,
}

/// Reads tokens from a borrowed source string against a shared compiled
/// rule. Each reader owns its own cursor and context state; the rule is
/// immutable and may back any number of readers concurrently.
pub struct TokenReader<'s> {
    rule: Arc<LexerRule>,
    source: &'s str,
    pos: usize,
    context: ContextId,
    strategy: ReaderStrategy,
    eof_emitted: bool,
}

impl<'s> TokenReader<'s> {
    pub(crate) fn new(rule: Arc<LexerRule>, source: &'s str, strategy: ReaderStrategy) -> Self {
        Self {
            rule,
            source,
            pos: 0,
            context: ContextId::INITIAL,
            strategy,
            eof_emitted: false,
        }
    }

    /// Read the next token.
    ///
    /// Skip actions are transparent: the reader keeps scanning until a token
    /// is produced, the input is exhausted (an end-of-file token, repeated
    /// on every later call), or nothing matches.
    ///
    /// # Errors
    ///
    /// Returns the [`NoMatch`] value when no symbol of the active context
    /// matches at the current position; the position is unchanged.
    pub fn read_token(&mut self) -> Result<Token, NoMatch> {
        loop {
            if self.pos >= self.source.len() {
                match self.read_eof() {
                    Some(token) => return Ok(token),
                    // An <<EOF>> action switched context; scan again there.
                    None => continue,
                }
            }
            let outcome = match self.strategy {
                ReaderStrategy::LongestMatch => self.scan_longest(),
                ReaderStrategy::TrailingContext => self.scan_trailing(),
                ReaderStrategy::Rejectable => self.scan_rejectable(),
            };
            match outcome {
                ScanOutcome::Token(token) => return Ok(token),
                ScanOutcome::Skip => {}
                ScanOutcome::NoMatch => {
                    return Err(NoMatch {
                        at: TextSize::from_usize(self.pos),
                        context: self.context,
                    });
                }
            }
        }
    }

    /// Advance past one character without matching anything; the canonical
    /// caller-side recovery after [`NoMatch`].
    pub fn bump(&mut self) -> Option<char> {
        let c = self.source[self.pos..].chars().next()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    #[must_use]
    pub fn position(&self) -> TextSize {
        TextSize::from_usize(self.pos)
    }

    #[must_use]
    pub const fn context(&self) -> ContextId {
        self.context
    }

    pub fn set_context(&mut self, context: ContextId) {
        self.context = context;
    }

    /// Switch to the context with the given label, if it exists.
    pub fn begin(&mut self, label: &str) -> bool {
        match self.rule.context(label) {
            Some(id) => {
                self.context = id;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub const fn strategy(&self) -> ReaderStrategy {
        self.strategy
    }

    #[must_use]
    pub const fn source(&self) -> &'s str {
        self.source
    }

    /// End-of-input handling. `None` means an `<<EOF>>` action switched the
    /// context and the caller should scan again.
    fn read_eof(&mut self) -> Option<Token> {
        let at = TextSize::from_usize(self.source.len());
        if self.eof_emitted {
            return Some(Token::end_of_file(at));
        }
        self.eof_emitted = true;

        let rule = Arc::clone(&self.rule);
        let Some(index) = rule.eof_symbol(self.context) else {
            return Some(Token::end_of_file(at));
        };
        let meta = &rule.symbols[index as usize];
        let lexeme = Lexeme {
            text: "",
            range: TextRange::empty(at),
            id: meta.id.as_deref(),
            order: meta.order,
        };
        let mut control = ReadControl {
            rule: &rule,
            current: self.context,
            requested: None,
        };
        match (meta.action)(&lexeme, &mut control) {
            ActionDecision::Emit => {
                if let Some(next) = control.requested {
                    self.context = next;
                }
                Some(Token {
                    id: meta.id.clone(),
                    order: meta.order,
                    text: compact_str::CompactString::default(),
                    range: TextRange::empty(at),
                    eof: true,
                })
            }
            ActionDecision::Skip | ActionDecision::Reject => match control.requested {
                Some(next) if next != self.context => {
                    self.context = next;
                    self.eof_emitted = false;
                    None
                }
                // A skip that goes nowhere would loop forever; fall back to
                // the default end-of-file token.
                _ => Some(Token::end_of_file(at)),
            },
        }
    }

    /// Maximal munch without trailing bookkeeping: the boundary of the best
    /// match is simply where it ended.
    fn scan_longest(&mut self) -> ScanOutcome {
        let rule = Arc::clone(&self.rule);
        let start = self.pos;
        let mut state = rule.start_state(self.context);
        let mut cursor = start;
        let mut last_accept: Option<(u32, usize)> = None;

        for c in self.source[start..].chars() {
            let Some(next) = rule.state(state).transition(c) else {
                break;
            };
            state = next;
            cursor += c.len_utf8();
            // Only the first (highest-priority) accepting entry matters, and
            // only when it is a real symbol rather than a trailing marker.
            if let Some(&first) = rule.state(state).accepting.first()
                && rule.is_real(first)
            {
                last_accept = Some((first, cursor));
            }
        }

        match last_accept {
            None => ScanOutcome::NoMatch,
            Some((symbol, boundary)) => self.dispatch(&rule, symbol, start, boundary),
        }
    }

    /// Maximal munch with a per-character offset journal so the token
    /// boundary can be rewound by the symbol's trailing value.
    fn scan_trailing(&mut self) -> ScanOutcome {
        let rule = Arc::clone(&self.rule);
        let start = self.pos;
        let mut state = rule.start_state(self.context);
        // offsets[k] = byte position after consuming k characters.
        let mut offsets: SmallVec<[usize; 32]> = SmallVec::new();
        offsets.push(start);
        let mut last_accept: Option<(u32, usize)> = None;

        for c in self.source[start..].chars() {
            let Some(next) = rule.state(state).transition(c) else {
                break;
            };
            state = next;
            offsets.push(offsets[offsets.len() - 1] + c.len_utf8());
            if let Some(&first) = rule.state(state).accepting.first()
                && rule.is_real(first)
            {
                last_accept = Some((first, offsets.len() - 1));
            }
        }

        let Some((symbol, chars)) = last_accept else {
            return ScanOutcome::NoMatch;
        };
        let Some(boundary) = resolve_boundary(&rule, symbol, &offsets, chars) else {
            return ScanOutcome::NoMatch;
        };
        if boundary == start {
            // Trailing trim produced an empty token; treat as no match
            // rather than emitting tokens that never advance the stream.
            return ScanOutcome::NoMatch;
        }
        self.dispatch(&rule, symbol, start, boundary)
    }

    /// Like [`Self::scan_trailing`], but every real accepting entry seen
    /// during the scan is retained as a fallback candidate so actions can
    /// reject their own match.
    fn scan_rejectable(&mut self) -> ScanOutcome {
        let rule = Arc::clone(&self.rule);
        let start = self.pos;
        let mut state = rule.start_state(self.context);
        let mut offsets: SmallVec<[usize; 32]> = SmallVec::new();
        offsets.push(start);
        // (characters consumed, symbol index)
        let mut candidates: SmallVec<[(usize, u32); 8]> = SmallVec::new();

        for c in self.source[start..].chars() {
            let Some(next) = rule.state(state).transition(c) else {
                break;
            };
            state = next;
            offsets.push(offsets[offsets.len() - 1] + c.len_utf8());
            let chars = offsets.len() - 1;
            for &entry in &rule.state(state).accepting {
                if !rule.is_real(entry) {
                    // Markers sort after every real symbol.
                    break;
                }
                candidates.push((chars, entry));
            }
        }

        // Stream position descending, then priority ascending: rejection
        // always retries the next best option.
        candidates.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        for &(chars, symbol) in &candidates {
            let Some(boundary) = resolve_boundary(&rule, symbol, &offsets, chars) else {
                continue;
            };
            if boundary == start {
                continue;
            }
            match self.try_candidate(&rule, symbol, start, boundary) {
                CandidateOutcome::Done(outcome) => return outcome,
                CandidateOutcome::Rejected => self.pos = start,
            }
        }
        self.pos = start;
        ScanOutcome::NoMatch
    }

    /// Force the stream to the resolved boundary and run the symbol's
    /// action. Outside a rejectable reader, `Reject` degrades to `Skip`.
    fn dispatch(
        &mut self,
        rule: &LexerRule,
        symbol: u32,
        start: usize,
        boundary: usize,
    ) -> ScanOutcome {
        let meta = &rule.symbols[symbol as usize];
        self.pos = boundary;
        let text = &self.source[start..boundary];
        let range = TextRange::new(TextSize::from_usize(start), TextSize::from_usize(boundary));
        let lexeme = Lexeme {
            text,
            range,
            id: meta.id.as_deref(),
            order: meta.order,
        };
        let mut control = ReadControl {
            rule,
            current: self.context,
            requested: None,
        };
        match (meta.action)(&lexeme, &mut control) {
            ActionDecision::Emit => {
                if let Some(next) = control.requested {
                    self.context = next;
                }
                ScanOutcome::Token(Token::new(meta.id.clone(), meta.order, text, range))
            }
            ActionDecision::Skip | ActionDecision::Reject => {
                if let Some(next) = control.requested {
                    self.context = next;
                }
                ScanOutcome::Skip
            }
        }
    }

    fn try_candidate(
        &mut self,
        rule: &LexerRule,
        symbol: u32,
        start: usize,
        boundary: usize,
    ) -> CandidateOutcome {
        let meta = &rule.symbols[symbol as usize];
        self.pos = boundary;
        let text = &self.source[start..boundary];
        let range = TextRange::new(TextSize::from_usize(start), TextSize::from_usize(boundary));
        let lexeme = Lexeme {
            text,
            range,
            id: meta.id.as_deref(),
            order: meta.order,
        };
        let mut control = ReadControl {
            rule,
            current: self.context,
            requested: None,
        };
        match (meta.action)(&lexeme, &mut control) {
            ActionDecision::Emit => {
                if let Some(next) = control.requested {
                    self.context = next;
                }
                CandidateOutcome::Done(ScanOutcome::Token(Token::new(
                    meta.id.clone(),
                    meta.order,
                    text,
                    range,
                )))
            }
            ActionDecision::Skip => {
                if let Some(next) = control.requested {
                    self.context = next;
                }
                CandidateOutcome::Done(ScanOutcome::Skip)
            }
            // The context switch of a rejecting action is discarded along
            // with its match.
            ActionDecision::Reject => CandidateOutcome::Rejected,
        }
    }
}

/// The trailing-context rewind arithmetic over the offset journal.
///
/// `chars` is the character count of the longest real match. A positive
/// trailing value is a fixed *leading* length measured from the scan start;
/// any other value (zero included) is the negated fixed length of the
/// lookahead, trimmed off the end of the match.
fn resolve_boundary(
    rule: &LexerRule,
    symbol: u32,
    offsets: &[usize],
    chars: usize,
) -> Option<usize> {
    let meta = &rule.symbols[symbol as usize];
    let index = match Trailing::from_raw(meta.trailing) {
        Trailing::None => chars,
        Trailing::FixedLead(n) => n as usize,
        Trailing::FixedTail(m) => chars.checked_sub(m as usize)?,
    };
    offsets.get(index).copied()
}
