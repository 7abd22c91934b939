//! Subset construction: one DFA over all symbols of all contexts, with a
//! designated start state per context and disjoint transition ranges.

use hashbrown::HashMap;
use smallvec::SmallVec;
use std::sync::Arc;

use super::nfa::{Nfa, epsilon_closure};
use super::rule::{DfaState, LexerRule, StateId, SymbolMeta};
use crate::error::CompileError;
use crate::grammar::{LexerContext, TerminalSymbol};
use crate::pattern::Ast;

type StateSet = SmallVec<[u32; 8]>;

/// Compile the accumulated symbols and contexts into an immutable rule.
///
/// Trailing-context patterns are composed as body fragment → synthetic
/// marker accept → lookahead fragment → real accept; marker indices start at
/// `symbols.len()`. `<<EOF>>` symbols never enter the automaton and are
/// recorded per context instead.
pub(crate) fn compile(
    symbols: &[TerminalSymbol],
    contexts: &[LexerContext],
) -> Result<LexerRule, CompileError> {
    let real_count = u32::try_from(symbols.len()).unwrap_or(u32::MAX);
    let mut nfa = Nfa::new();
    let context_starts: Vec<u32> = contexts.iter().map(|_| nfa.add_state()).collect();
    let mut next_marker = real_count;
    let mut eof_symbols: Vec<Option<u32>> = vec![None; contexts.len()];

    for (index, symbol) in symbols.iter().enumerate() {
        let index = u32::try_from(index).unwrap_or(u32::MAX);

        if symbol.eof {
            // First <<EOF>> definition per context wins, like rule order.
            for ctx in &symbol.contexts {
                let slot = &mut eof_symbols[ctx.index()];
                if slot.is_none() {
                    *slot = Some(index);
                }
            }
            continue;
        }

        let frag_start = nfa.add_state();
        match &*symbol.pattern {
            Ast::Trailing { body, look } => {
                if symbol.trailing.is_none() {
                    return Err(CompileError::VariableTrailingContext {
                        symbol: symbol.display_name(),
                    });
                }
                let mid = nfa.add_state();
                nfa.compile(body, frag_start, mid);
                nfa.state_mut(mid).accepting = Some(next_marker);
                next_marker += 1;
                let fin = nfa.add_state();
                nfa.compile(look, mid, fin);
                nfa.state_mut(fin).accepting = Some(index);
            }
            ast => {
                let fin = nfa.add_state();
                nfa.compile(ast, frag_start, fin);
                nfa.state_mut(fin).accepting = Some(index);
            }
        }
        for ctx in &symbol.contexts {
            nfa.add_epsilon(context_starts[ctx.index()], frag_start);
        }
    }

    let (states, start_states) = determinize(&nfa, &context_starts);

    Ok(LexerRule {
        states,
        start_states,
        symbols: symbols
            .iter()
            .map(|s| SymbolMeta {
                id: s.id.clone(),
                order: s.order,
                trailing: s.trailing,
                action: Arc::clone(&s.action),
            })
            .collect(),
        marker_count: next_marker - real_count,
        contexts: contexts
            .iter()
            .map(|c| (c.label.clone(), c.kind()))
            .collect(),
        eof_symbols,
    })
}

struct Determinizer {
    interned: HashMap<StateSet, StateId, ahash::RandomState>,
    states: Vec<DfaState>,
    worklist: Vec<(StateSet, StateId)>,
}

impl Determinizer {
    fn intern(&mut self, set: StateSet) -> StateId {
        if let Some(&id) = self.interned.get(&set) {
            return id;
        }
        let id = StateId(u32::try_from(self.states.len()).unwrap_or(0));
        self.states.push(DfaState::default());
        self.interned.insert(set.clone(), id);
        self.worklist.push((set, id));
        id
    }
}

/// Worklist subset construction. Transition ranges of each output state are
/// split on every boundary occurring in the source ranges, so overlapping
/// character classes resolve exactly; adjacent segments with the same target
/// are merged back.
fn determinize(nfa: &Nfa, context_starts: &[u32]) -> (Vec<DfaState>, Vec<StateId>) {
    let mut builder = Determinizer {
        interned: HashMap::with_hasher(ahash::RandomState::new()),
        states: Vec::new(),
        worklist: Vec::new(),
    };

    let start_states: Vec<StateId> = context_starts
        .iter()
        .map(|&s| builder.intern(epsilon_closure(nfa, &[s])))
        .collect();

    while let Some((set, id)) = builder.worklist.pop() {
        let mut accepting: SmallVec<[u32; 2]> = set
            .iter()
            .filter_map(|&s| nfa.state(s).accepting)
            .collect();
        accepting.sort_unstable();
        accepting.dedup();

        let mut edges: Vec<(u32, u32, u32)> = Vec::new();
        for &s in &set {
            edges.extend_from_slice(&nfa.state(s).transitions);
        }

        let mut cuts: Vec<u32> = Vec::with_capacity(edges.len() * 2);
        for &(lo, hi, _) in &edges {
            cuts.push(lo);
            cuts.push(hi + 1);
        }
        cuts.sort_unstable();
        cuts.dedup();

        let mut transitions: Vec<(u32, u32, StateId)> = Vec::new();
        for pair in cuts.windows(2) {
            let (lo, hi) = (pair[0], pair[1] - 1);
            let mut targets: SmallVec<[u32; 8]> = edges
                .iter()
                .filter(|&&(a, b, _)| a <= lo && lo <= b)
                .map(|&(_, _, t)| t)
                .collect();
            if targets.is_empty() {
                continue;
            }
            targets.sort_unstable();
            targets.dedup();
            let target_id = builder.intern(epsilon_closure(nfa, &targets));
            match transitions.last_mut() {
                Some(last) if last.2 == target_id && last.1 + 1 == lo => last.1 = hi,
                _ => transitions.push((lo, hi, target_id)),
            }
        }

        builder.states[id.index()] = DfaState {
            transitions,
            accepting,
        };
    }

    (builder.states, start_states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grammar;

    #[test]
    fn test_compile_smoke() {
        let mut grammar = Grammar::new();
        grammar
            .define_symbol(Some("digits"), "[0-9]+", None, None)
            .unwrap();
        grammar.define_symbol(Some("word"), "[a-z]+", None, None).unwrap();
        let rule = grammar.rule().unwrap();

        assert_eq!(rule.symbol_count(), 2);
        assert_eq!(rule.marker_count(), 0);
        assert_eq!(rule.context_count(), 1);
        assert!(rule.state_count() > 1);
        assert!(!rule.has_trailing());
    }

    #[test]
    fn test_compile_trailing_creates_marker() {
        let mut grammar = Grammar::new();
        grammar.define_symbol(Some("t"), "a+/b", None, None).unwrap();
        let rule = grammar.rule().unwrap();

        assert_eq!(rule.symbol_count(), 1);
        assert_eq!(rule.marker_count(), 1);
        assert!(rule.has_trailing());
    }

    #[test]
    fn test_compile_variable_trailing_context_fails() {
        let mut grammar = Grammar::new();
        grammar.define_symbol(Some("vv"), "a+/b+", None, None).unwrap();
        let err = grammar.rule();
        assert!(matches!(
            err,
            Err(CompileError::VariableTrailingContext { .. })
        ));
    }

    #[test]
    fn test_overlapping_classes_resolve_to_disjoint_ranges() {
        let mut grammar = Grammar::new();
        grammar.define_symbol(Some("hex"), "[0-9a-f]+", None, None).unwrap();
        grammar.define_symbol(Some("word"), "[a-z]+", None, None).unwrap();
        let rule = grammar.rule().unwrap();

        // Every state's ranges must be disjoint and sorted.
        for state in &rule.states {
            for pair in state.transitions.windows(2) {
                assert!(pair[0].1 < pair[1].0);
            }
        }
    }

    #[test]
    fn test_contexts_get_separate_start_states() {
        let mut grammar = Grammar::new();
        grammar.define_context("STRING").unwrap();
        grammar.define_symbol(Some("a"), "a", None, None).unwrap();
        grammar
            .define_symbol(Some("s"), "b", None, Some(&["STRING"]))
            .unwrap();
        let rule = grammar.rule().unwrap();

        assert_eq!(rule.start_states.len(), 2);
        assert_ne!(rule.start_states[0], rule.start_states[1]);
    }
}
