//! Recursive-descent parser for the pattern mini-syntax.
//!
//! Precedence, loosest first: `/` (top level only), `|`, concatenation,
//! postfix repetition, atoms.

use super::{Ast, CharSet, NamedPatterns};
use crate::error::{PatternError, PatternErrorKind};

/// Parse `text` against the given named-pattern table.
///
/// `allow_trailing` is false for named sub-patterns, where the `/` operator
/// has no meaning.
pub(crate) fn parse(
    text: &str,
    named: &NamedPatterns,
    allow_trailing: bool,
) -> Result<Ast, PatternError> {
    let mut parser = Parser::new(text, named);
    let body = parser.alternation()?;

    let ast = if parser.peek() == Some('/') {
        let slash = parser.offset();
        if !allow_trailing {
            return Err(err(slash, PatternErrorKind::TrailingNotAllowed));
        }
        parser.bump();
        let look = parser.alternation()?;
        if parser.peek() == Some('/') {
            return Err(err(parser.offset(), PatternErrorKind::DuplicateTrailing));
        }
        Ast::Trailing {
            body: Box::new(body),
            look: Box::new(look),
        }
    } else {
        body
    };

    match parser.peek() {
        None => Ok(ast),
        Some(')') => Err(err(parser.offset(), PatternErrorKind::UnbalancedGroup)),
        Some('/') => Err(err(parser.offset(), PatternErrorKind::TrailingNotAllowed)),
        Some(ch) => Err(err(parser.offset(), PatternErrorKind::UnexpectedChar { ch })),
    }
}

fn err(offset: usize, kind: PatternErrorKind) -> PatternError {
    PatternError::new(offset, kind)
}

fn repeat(node: Ast, min: u32, max: Option<u32>) -> Ast {
    Ast::Repeat {
        node: Box::new(node),
        min,
        max,
    }
}

enum ClassItem {
    Char(char),
    Set(CharSet),
}

struct Parser<'a> {
    chars: Vec<(usize, char)>,
    idx: usize,
    end: usize,
    named: &'a NamedPatterns,
}

impl<'a> Parser<'a> {
    fn new(text: &str, named: &'a NamedPatterns) -> Self {
        Self {
            chars: text.char_indices().collect(),
            idx: 0,
            end: text.len(),
            named,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.idx + n).map(|&(_, c)| c)
    }

    /// Byte offset of the next character, or the pattern length at the end.
    fn offset(&self) -> usize {
        self.chars.get(self.idx).map_or(self.end, |&(o, _)| o)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.idx += 1;
        }
        c
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.idx += 1;
            true
        } else {
            false
        }
    }

    fn alternation(&mut self) -> Result<Ast, PatternError> {
        let mut alts = vec![self.concat()?];
        while self.eat('|') {
            alts.push(self.concat()?);
        }
        if alts.len() == 1 {
            Ok(alts.swap_remove(0))
        } else {
            Ok(Ast::Alt(alts))
        }
    }

    fn concat(&mut self) -> Result<Ast, PatternError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some('|' | ')' | '/') => break,
                Some(_) => items.push(self.repetition()?),
            }
        }
        if items.is_empty() {
            Ok(Ast::Empty)
        } else if items.len() == 1 {
            Ok(items.swap_remove(0))
        } else {
            Ok(Ast::Concat(items))
        }
    }

    fn repetition(&mut self) -> Result<Ast, PatternError> {
        let mut node = self.atom()?;
        loop {
            match self.peek() {
                Some('*') => {
                    self.bump();
                    node = repeat(node, 0, None);
                }
                Some('+') => {
                    self.bump();
                    node = repeat(node, 1, None);
                }
                Some('?') => {
                    self.bump();
                    node = repeat(node, 0, Some(1));
                }
                // `{` opens counted repetition only when a digit follows;
                // `{name}` is an atom and ends this postfix chain.
                Some('{') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                    node = self.counted(node)?;
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn counted(&mut self, node: Ast) -> Result<Ast, PatternError> {
        let open = self.offset();
        self.bump(); // '{'
        let Some(min) = self.number() else {
            return Err(err(open, PatternErrorKind::InvalidRepetition));
        };
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                match self.number() {
                    Some(n) => Some(n),
                    None => return Err(err(open, PatternErrorKind::InvalidRepetition)),
                }
            }
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(err(open, PatternErrorKind::InvalidRepetition));
        }
        if let Some(mx) = max
            && mx < min
        {
            return Err(err(open, PatternErrorKind::InvalidRepetition));
        }
        Ok(repeat(node, min, max))
    }

    fn number(&mut self) -> Option<u32> {
        let mut value: Option<u32> = None;
        while let Some(c) = self.peek()
            && let Some(digit) = c.to_digit(10)
        {
            self.bump();
            value = Some(value.unwrap_or(0).checked_mul(10)?.checked_add(digit)?);
        }
        value
    }

    fn atom(&mut self) -> Result<Ast, PatternError> {
        let offset = self.offset();
        match self.bump() {
            None => Err(err(offset, PatternErrorKind::UnexpectedEnd)),
            Some('(') => {
                let inner = self.alternation()?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err(err(offset, PatternErrorKind::UnbalancedGroup))
                }
            }
            Some('[') => self.class(offset),
            Some('"') => self.quoted(offset),
            Some('.') => Ok(Ast::Any),
            Some('{') => self.named_reference(offset),
            Some('\\') => self.escape(offset),
            Some('*' | '+' | '?') => Err(err(offset, PatternErrorKind::DanglingRepetition)),
            Some(c) => Ok(Ast::Literal(c)),
        }
    }

    fn named_reference(&mut self, open: usize) -> Result<Ast, PatternError> {
        if self.peek().is_some_and(|c| c.is_ascii_digit()) {
            // `{3}` with nothing before it.
            return Err(err(open, PatternErrorKind::DanglingRepetition));
        }
        let mut name = compact_str::CompactString::default();
        while let Some(c) = self.peek()
            && (c.is_ascii_alphanumeric() || c == '_')
        {
            self.bump();
            name.push(c);
        }
        if !self.eat('}') {
            return Err(err(open, PatternErrorKind::UnterminatedName));
        }
        match self.named.get(name.as_str()) {
            Some(ast) => Ok((**ast).clone()),
            None => Err(err(
                open,
                PatternErrorKind::UnknownNamedPattern {
                    name: name.to_string(),
                },
            )),
        }
    }

    fn escape(&mut self, offset: usize) -> Result<Ast, PatternError> {
        match self.bump() {
            None => Err(err(offset, PatternErrorKind::UnexpectedEnd)),
            Some('n') => Ok(Ast::Literal('\n')),
            Some('t') => Ok(Ast::Literal('\t')),
            Some('r') => Ok(Ast::Literal('\r')),
            Some('f') => Ok(Ast::Literal('\x0C')),
            Some('0') => Ok(Ast::Literal('\0')),
            Some('d') => Ok(Ast::Class(CharSet::digits())),
            Some('D') => Ok(Ast::Class(CharSet::negated(vec![('0', '9')]))),
            Some('s') => Ok(Ast::Class(CharSet::whitespace())),
            Some('S') => Ok(Ast::Class(CharSet::negated(vec![
                ('\t', '\r'),
                (' ', ' '),
            ]))),
            Some('w') => Ok(Ast::Class(CharSet::word())),
            Some('W') => Ok(Ast::Class(CharSet::negated(vec![
                ('0', '9'),
                ('A', 'Z'),
                ('_', '_'),
                ('a', 'z'),
            ]))),
            Some(c) if c.is_ascii_alphanumeric() => {
                Err(err(offset, PatternErrorKind::InvalidEscape { escape: c }))
            }
            Some(c) => Ok(Ast::Literal(c)),
        }
    }

    fn class(&mut self, open: usize) -> Result<Ast, PatternError> {
        let negated = self.eat('^');
        let mut set = CharSet::empty(negated);
        loop {
            match self.peek() {
                None => return Err(err(open, PatternErrorKind::UnterminatedClass)),
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    let item_offset = self.offset();
                    match self.class_item(item_offset)? {
                        ClassItem::Set(shorthand) => set.extend(&shorthand),
                        ClassItem::Char(lo) => {
                            // `a-z` range, unless the '-' is the last class
                            // character (then it is a literal).
                            if self.peek() == Some('-')
                                && self.peek_at(1).is_some_and(|c| c != ']')
                            {
                                self.bump(); // '-'
                                let hi_offset = self.offset();
                                match self.class_item(hi_offset)? {
                                    ClassItem::Char(hi) if lo <= hi => set.insert(lo, hi),
                                    _ => {
                                        return Err(err(
                                            item_offset,
                                            PatternErrorKind::InvalidClassRange,
                                        ));
                                    }
                                }
                            } else {
                                set.insert(lo, lo);
                            }
                        }
                    }
                }
            }
        }
        Ok(Ast::Class(set))
    }

    fn class_item(&mut self, offset: usize) -> Result<ClassItem, PatternError> {
        match self.bump() {
            None => Err(err(offset, PatternErrorKind::UnterminatedClass)),
            Some('\\') => match self.bump() {
                None => Err(err(offset, PatternErrorKind::UnexpectedEnd)),
                Some('n') => Ok(ClassItem::Char('\n')),
                Some('t') => Ok(ClassItem::Char('\t')),
                Some('r') => Ok(ClassItem::Char('\r')),
                Some('f') => Ok(ClassItem::Char('\x0C')),
                Some('0') => Ok(ClassItem::Char('\0')),
                Some('d') => Ok(ClassItem::Set(CharSet::digits())),
                Some('s') => Ok(ClassItem::Set(CharSet::whitespace())),
                Some('w') => Ok(ClassItem::Set(CharSet::word())),
                Some(c) if c.is_ascii_alphanumeric() => {
                    Err(err(offset, PatternErrorKind::InvalidEscape { escape: c }))
                }
                Some(c) => Ok(ClassItem::Char(c)),
            },
            Some(c) => Ok(ClassItem::Char(c)),
        }
    }

    fn quoted(&mut self, open: usize) -> Result<Ast, PatternError> {
        let mut items = Vec::new();
        loop {
            match self.bump() {
                None => return Err(err(open, PatternErrorKind::UnterminatedQuote)),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    None => return Err(err(open, PatternErrorKind::UnterminatedQuote)),
                    Some('n') => items.push(Ast::Literal('\n')),
                    Some('t') => items.push(Ast::Literal('\t')),
                    Some('r') => items.push(Ast::Literal('\r')),
                    Some(c) => items.push(Ast::Literal(c)),
                },
                Some(c) => items.push(Ast::Literal(c)),
            }
        }
        if items.is_empty() {
            Ok(Ast::Empty)
        } else if items.len() == 1 {
            Ok(items.swap_remove(0))
        } else {
            Ok(Ast::Concat(items))
        }
    }
}
