//! Thompson construction from parsed patterns.
//!
//! Counted repetition is expanded structurally; trailing context is composed
//! at the symbol level in [`super::dfa`], not here.

use smallvec::SmallVec;

use crate::pattern::{Ast, CharSet};

/// NFA state used during construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct NfaState {
    /// `(lo, hi, target)`: inclusive codepoint range transitions.
    pub(crate) transitions: Vec<(u32, u32, u32)>,
    pub(crate) epsilon: SmallVec<[u32; 2]>,
    /// Accepting entry: a real symbol index or a synthetic trailing marker.
    pub(crate) accepting: Option<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct Nfa {
    pub(crate) states: Vec<NfaState>,
}

impl Nfa {
    pub(crate) fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub(crate) fn add_state(&mut self) -> u32 {
        let id = u32::try_from(self.states.len()).unwrap_or(0);
        self.states.push(NfaState::default());
        id
    }

    pub(crate) fn state(&self, id: u32) -> &NfaState {
        &self.states[id as usize]
    }

    pub(crate) fn state_mut(&mut self, id: u32) -> &mut NfaState {
        &mut self.states[id as usize]
    }

    pub(crate) fn add_epsilon(&mut self, from: u32, to: u32) {
        self.state_mut(from).epsilon.push(to);
    }

    fn add_range(&mut self, from: u32, lo: u32, hi: u32, to: u32) {
        self.state_mut(from).transitions.push((lo, hi, to));
    }

    /// Connect `start` to `end` with a fragment matching `ast`.
    pub(crate) fn compile(&mut self, ast: &Ast, start: u32, end: u32) {
        match ast {
            Ast::Empty => self.add_epsilon(start, end),
            Ast::Literal(c) => self.add_range(start, *c as u32, *c as u32, end),
            Ast::Class(set) => {
                for (lo, hi) in set.code_ranges() {
                    self.add_range(start, lo, hi, end);
                }
            }
            Ast::Any => {
                // Any character except newline.
                for (lo, hi) in CharSet::negated(vec![('\n', '\n')]).code_ranges() {
                    self.add_range(start, lo, hi, end);
                }
            }
            Ast::Concat(items) => {
                let mut current = start;
                for (i, item) in items.iter().enumerate() {
                    let next = if i == items.len() - 1 {
                        end
                    } else {
                        self.add_state()
                    };
                    self.compile(item, current, next);
                    current = next;
                }
            }
            Ast::Alt(items) => {
                for item in items {
                    self.compile(item, start, end);
                }
            }
            Ast::Repeat { node, min, max } => {
                // Mandatory copies first, then either a loop (unbounded) or
                // optional copies up to the bound.
                let mut current = start;
                for _ in 0..*min {
                    let next = self.add_state();
                    self.compile(node, current, next);
                    current = next;
                }
                match max {
                    None => {
                        let inner_start = self.add_state();
                        let inner_end = self.add_state();
                        self.add_epsilon(current, inner_start);
                        self.add_epsilon(current, end);
                        self.compile(node, inner_start, inner_end);
                        self.add_epsilon(inner_end, inner_start);
                        self.add_epsilon(inner_end, end);
                    }
                    Some(max) => {
                        for _ in *min..*max {
                            let next = self.add_state();
                            self.add_epsilon(current, end);
                            self.compile(node, current, next);
                            current = next;
                        }
                        self.add_epsilon(current, end);
                    }
                }
            }
            Ast::Trailing { .. } => {
                unreachable!("trailing context is composed at the symbol level")
            }
        }
    }
}

/// Sorted epsilon closure of `seed`.
pub(crate) fn epsilon_closure(nfa: &Nfa, seed: &[u32]) -> SmallVec<[u32; 8]> {
    let mut closure: hashbrown::HashSet<u32, ahash::RandomState> =
        hashbrown::HashSet::with_hasher(ahash::RandomState::new());
    let mut stack: Vec<u32> = seed.to_vec();
    closure.extend(seed.iter().copied());

    while let Some(state) = stack.pop() {
        for &next in &nfa.state(state).epsilon {
            if closure.insert(next) {
                stack.push(next);
            }
        }
    }

    let mut sorted: SmallVec<[u32; 8]> = closure.into_iter().collect();
    sorted.sort_unstable();
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse_pattern;

    fn single_fragment(pattern: &str) -> (Nfa, u32, u32) {
        let ast = parse_pattern(pattern).unwrap();
        let mut nfa = Nfa::new();
        let start = nfa.add_state();
        let end = nfa.add_state();
        nfa.compile(&ast, start, end);
        (nfa, start, end)
    }

    /// Walk the NFA naively to check acceptance of `input` at `end`.
    fn accepts(nfa: &Nfa, start: u32, end: u32, input: &str) -> bool {
        let mut current = epsilon_closure(nfa, &[start]);
        for c in input.chars() {
            let cp = c as u32;
            let mut next: Vec<u32> = Vec::new();
            for &s in &current {
                for &(lo, hi, to) in &nfa.state(s).transitions {
                    if cp >= lo && cp <= hi {
                        next.push(to);
                    }
                }
            }
            current = epsilon_closure(nfa, &next);
            if current.is_empty() {
                return false;
            }
        }
        current.contains(&end)
    }

    #[test]
    fn test_literal_chain() {
        let (nfa, start, end) = single_fragment("abc");
        assert!(accepts(&nfa, start, end, "abc"));
        assert!(!accepts(&nfa, start, end, "ab"));
        assert!(!accepts(&nfa, start, end, "abd"));
    }

    #[test]
    fn test_kleene_and_plus() {
        let (nfa, start, end) = single_fragment("a*");
        assert!(accepts(&nfa, start, end, ""));
        assert!(accepts(&nfa, start, end, "aaaa"));

        let (nfa, start, end) = single_fragment("a+");
        assert!(!accepts(&nfa, start, end, ""));
        assert!(accepts(&nfa, start, end, "a"));
        assert!(accepts(&nfa, start, end, "aaa"));
    }

    #[test]
    fn test_counted_repetition() {
        let (nfa, start, end) = single_fragment("a{2,3}");
        assert!(!accepts(&nfa, start, end, "a"));
        assert!(accepts(&nfa, start, end, "aa"));
        assert!(accepts(&nfa, start, end, "aaa"));
        assert!(!accepts(&nfa, start, end, "aaaa"));
    }

    #[test]
    fn test_alternation_and_class() {
        let (nfa, start, end) = single_fragment("ab|[0-9]");
        assert!(accepts(&nfa, start, end, "ab"));
        assert!(accepts(&nfa, start, end, "7"));
        assert!(!accepts(&nfa, start, end, "a"));
    }

    #[test]
    fn test_any_excludes_newline() {
        let (nfa, start, end) = single_fragment(".");
        assert!(accepts(&nfa, start, end, "x"));
        assert!(accepts(&nfa, start, end, "€"));
        assert!(!accepts(&nfa, start, end, "\n"));
    }
}
