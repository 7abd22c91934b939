//! Regular-expression patterns: the parsed representation consumed by the
//! automaton builder, plus the mini-syntax parser.
//!
//! The syntax is the lex flavor rather than a general-purpose regex dialect:
//! literals, escapes, character classes with negation, `.`, grouping,
//! alternation, `* + ?` and counted `{m,n}` repetition, quoted literals,
//! `{name}` references to named sub-patterns, and a single top-level `/`
//! trailing-context operator. Context prefixes (`<ctx>...`) are stripped by
//! the grammar builder before a pattern reaches this module.

mod parser;

use compact_str::CompactString;
use std::sync::Arc;

pub(crate) use parser::parse;

use crate::error::PatternError;

/// Named sub-pattern table; later definitions may reference earlier ones,
/// never the other way around (single forward pass).
pub(crate) type NamedPatterns =
    hashbrown::HashMap<CompactString, Arc<Ast>, ahash::RandomState>;

/// Parsed pattern tree.
///
/// `Trailing` only ever appears at the root: the parser rejects `/` inside
/// groups and in named sub-patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ast {
    /// Matches the empty string.
    Empty,
    /// A single character.
    Literal(char),
    /// A character class, possibly negated.
    Class(CharSet),
    /// Any character except newline (`.`).
    Any,
    Concat(Vec<Ast>),
    Alt(Vec<Ast>),
    Repeat {
        node: Box<Ast>,
        min: u32,
        max: Option<u32>,
    },
    /// `body/look`: `look` must match for `body` to be accepted, but is not
    /// part of the emitted token.
    Trailing { body: Box<Ast>, look: Box<Ast> },
}

/// Parse a pattern string without named sub-patterns.
///
/// Convenience entry for building pre-parsed [`Ast`] values to hand to
/// [`crate::Grammar::define_symbol`] verbatim.
///
/// # Errors
///
/// Returns a [`PatternError`] describing the first fault in the text.
pub fn parse_pattern(text: &str) -> Result<Ast, PatternError> {
    parse(text, &NamedPatterns::default(), true)
}

/// Length in characters matched by `ast`, when that length is the same for
/// every possible match. Drives the trailing-context encoding.
pub(crate) fn fixed_len(ast: &Ast) -> Option<u32> {
    match ast {
        Ast::Empty => Some(0),
        Ast::Literal(_) | Ast::Class(_) | Ast::Any => Some(1),
        Ast::Concat(items) => {
            let mut total = 0u32;
            for item in items {
                total = total.checked_add(fixed_len(item)?)?;
            }
            Some(total)
        }
        Ast::Alt(items) => {
            let mut len = None;
            for item in items {
                let item_len = fixed_len(item)?;
                match len {
                    None => len = Some(item_len),
                    Some(l) if l == item_len => {}
                    Some(_) => return None,
                }
            }
            len
        }
        Ast::Repeat { node, min, max } => {
            if *max == Some(*min) {
                fixed_len(node)?.checked_mul(*min)
            } else {
                None
            }
        }
        Ast::Trailing { .. } => None,
    }
}

/// A set of characters described by inclusive ranges, possibly negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharSet {
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharSet {
    #[must_use]
    pub const fn new(ranges: Vec<(char, char)>) -> Self {
        Self {
            ranges,
            negated: false,
        }
    }

    #[must_use]
    pub const fn negated(ranges: Vec<(char, char)>) -> Self {
        Self {
            ranges,
            negated: true,
        }
    }

    pub(crate) const fn empty(negated: bool) -> Self {
        Self {
            ranges: Vec::new(),
            negated,
        }
    }

    /// `[0-9]`, the expansion of `\d`.
    #[must_use]
    pub fn digits() -> Self {
        Self::new(vec![('0', '9')])
    }

    /// Space, tab, and the ASCII line-break characters; the expansion of `\s`.
    #[must_use]
    pub fn whitespace() -> Self {
        Self::new(vec![
            ('\t', '\r'), // tab, newline, vertical tab, form feed, carriage return
            (' ', ' '),
        ])
    }

    /// `[0-9A-Za-z_]`, the expansion of `\w`.
    #[must_use]
    pub fn word() -> Self {
        Self::new(vec![('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')])
    }

    pub fn insert(&mut self, lo: char, hi: char) {
        self.ranges.push((lo, hi));
    }

    /// Merge the (non-negated) ranges of `other` into this set.
    pub fn extend(&mut self, other: &Self) {
        self.ranges.extend_from_slice(&other.ranges);
    }

    #[must_use]
    pub fn matches(&self, c: char) -> bool {
        let inside = self.ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
        inside != self.negated
    }

    /// Resolve into disjoint, sorted codepoint ranges with negation applied
    /// and the surrogate gap excluded. This is the form the automaton
    /// builder consumes.
    pub(crate) fn code_ranges(&self) -> Vec<(u32, u32)> {
        let mut ranges: Vec<(u32, u32)> = self
            .ranges
            .iter()
            .map(|&(lo, hi)| (lo as u32, hi as u32))
            .collect();
        ranges.sort_unstable();

        // Merge overlapping and adjacent ranges.
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }

        let resolved = if self.negated {
            complement(&merged)
        } else {
            merged
        };
        exclude_surrogates(resolved)
    }
}

const MAX_CODEPOINT: u32 = 0x0010_FFFF;
const SURROGATE_LO: u32 = 0xD800;
const SURROGATE_HI: u32 = 0xDFFF;

/// Complement of sorted, disjoint `ranges` over the full codepoint space.
fn complement(ranges: &[(u32, u32)]) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    let mut next = 0u32;
    for &(lo, hi) in ranges {
        if lo > next {
            out.push((next, lo - 1));
        }
        next = hi.saturating_add(1);
        if next > MAX_CODEPOINT {
            return out;
        }
    }
    out.push((next, MAX_CODEPOINT));
    out
}

/// Split any range straddling the UTF-16 surrogate gap; those codepoints are
/// not `char`s and must never appear on a transition.
fn exclude_surrogates(ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        if hi < SURROGATE_LO || lo > SURROGATE_HI {
            out.push((lo, hi));
            continue;
        }
        if lo < SURROGATE_LO {
            out.push((lo, SURROGATE_LO - 1));
        }
        if hi > SURROGATE_HI {
            out.push((SURROGATE_HI + 1, hi));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_matches() {
        let digits = CharSet::digits();
        assert!(digits.matches('0'));
        assert!(digits.matches('9'));
        assert!(!digits.matches('a'));

        let not_digits = CharSet::negated(vec![('0', '9')]);
        assert!(!not_digits.matches('5'));
        assert!(not_digits.matches('x'));
    }

    #[test]
    fn test_code_ranges_merges_overlaps() {
        let set = CharSet::new(vec![('c', 'f'), ('a', 'd'), ('g', 'h')]);
        assert_eq!(set.code_ranges(), vec![('a' as u32, 'h' as u32)]);
    }

    #[test]
    fn test_code_ranges_complement_straddles_surrogates() {
        let set = CharSet::negated(vec![('a', 'z')]);
        let ranges = set.code_ranges();
        assert!(ranges.contains(&(0, 'a' as u32 - 1)));
        // The complement above 'z' is split around the surrogate gap.
        assert!(ranges.contains(&('z' as u32 + 1, SURROGATE_LO - 1)));
        assert!(ranges.contains(&(SURROGATE_HI + 1, MAX_CODEPOINT)));
    }

    #[test]
    fn test_fixed_len_basic() {
        assert_eq!(fixed_len(&parse_pattern("abc").unwrap()), Some(3));
        assert_eq!(fixed_len(&parse_pattern("[0-9]").unwrap()), Some(1));
        assert_eq!(fixed_len(&parse_pattern("a|b|c").unwrap()), Some(1));
        assert_eq!(fixed_len(&parse_pattern("ab|cd").unwrap()), Some(2));
        assert_eq!(fixed_len(&parse_pattern("a|bc").unwrap()), None);
        assert_eq!(fixed_len(&parse_pattern("a*").unwrap()), None);
        assert_eq!(fixed_len(&parse_pattern("a+").unwrap()), None);
        assert_eq!(fixed_len(&parse_pattern("a?").unwrap()), None);
    }

    #[test]
    fn test_fixed_len_counted() {
        assert_eq!(fixed_len(&parse_pattern("a{4}").unwrap()), Some(4));
        assert_eq!(fixed_len(&parse_pattern("(ab){3}").unwrap()), Some(6));
        assert_eq!(fixed_len(&parse_pattern("a{2,4}").unwrap()), None);
        assert_eq!(fixed_len(&parse_pattern("a{2,}").unwrap()), None);
    }

    #[test]
    fn test_fixed_len_empty() {
        assert_eq!(fixed_len(&Ast::Empty), Some(0));
        assert_eq!(fixed_len(&parse_pattern("\"\"").unwrap()), Some(0));
    }
}
