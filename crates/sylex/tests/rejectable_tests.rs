//! Reject-and-fall-back behavior of the rejectable reader: candidate
//! ordering, cascading rejection, and the degraded meaning of `Reject`
//! elsewhere.

use sylex::lexer::action;
use sylex::{ActionDecision, Grammar, TextSize};

fn reject_action() -> sylex::Action {
    action::wrap(|_, _| ActionDecision::Reject)
}

#[test]
fn test_reject_falls_back_to_shorter_match() {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("abc"), "abc", Some(reject_action()), None)
        .unwrap();
    grammar.define_symbol(Some("ab"), "ab", None, None).unwrap();
    grammar.define_symbol(Some("a"), "a", None, None).unwrap();

    let mut reader = grammar.rejectable_reader("abc").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.id.as_deref(), Some("ab"));
    assert_eq!(token.text, "ab");
    assert_eq!(reader.position(), TextSize::new(2));
}

#[test]
fn test_reject_falls_back_to_same_length_lower_priority() {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("first"), "ab", Some(reject_action()), None)
        .unwrap();
    grammar.define_symbol(Some("second"), "[a-b]{2}", None, None).unwrap();

    let mut reader = grammar.rejectable_reader("ab").unwrap();
    let token = reader.read_token().unwrap();
    // Same stream position, next priority.
    assert_eq!(token.id.as_deref(), Some("second"));
    assert_eq!(token.text, "ab");
}

#[test]
fn test_reject_cascade_exhausts_to_no_match() {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("a"), "a+", Some(reject_action()), None)
        .unwrap();

    let mut reader = grammar.rejectable_reader("aaa").unwrap();
    let failure = reader.read_token().unwrap_err();
    assert_eq!(failure.at, TextSize::new(0));
    assert_eq!(reader.position(), TextSize::new(0));
}

#[test]
fn test_reject_retries_shorter_match_of_same_symbol() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    // Reject exactly once: the fallback is the same symbol's next-shorter
    // match from the same scan.
    let calls = Arc::new(AtomicU32::new(0));
    let calls_in_action = Arc::clone(&calls);

    let mut grammar = Grammar::new();
    grammar
        .define_symbol(
            Some("run"),
            "a+",
            Some(action::wrap(move |_, _| {
                if calls_in_action.fetch_add(1, Ordering::SeqCst) == 0 {
                    ActionDecision::Reject
                } else {
                    ActionDecision::Emit
                }
            })),
            None,
        )
        .unwrap();

    let mut reader = grammar.rejectable_reader("aaa").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.text, "aa");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_rejecting_action_context_switch_is_discarded() {
    let mut grammar = Grammar::new();
    grammar.define_context("OTHER").unwrap();
    grammar
        .define_symbol(
            Some("sneaky"),
            "ab",
            Some(action::wrap(|_, control| {
                control.begin("OTHER");
                ActionDecision::Reject
            })),
            None,
        )
        .unwrap();
    grammar.define_symbol(Some("a"), "a", None, None).unwrap();

    let mut reader = grammar.rejectable_reader("ab").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.id.as_deref(), Some("a"));
    // The rejected action's switch request did not stick.
    assert_eq!(reader.context(), sylex::ContextId::INITIAL);
}

#[test]
fn test_without_rejection_behaves_like_longest_match() {
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("short"), "a", None, None).unwrap();
    grammar.define_symbol(Some("long"), "a+", None, None).unwrap();

    let mut reader = grammar.rejectable_reader("aaa").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.id.as_deref(), Some("long"));
    assert_eq!(token.text, "aaa");
}

#[test]
fn test_reject_in_plain_reader_degrades_to_skip() {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("noise"), "x+", Some(reject_action()), None)
        .unwrap();
    grammar.define_symbol(Some("word"), "[a-w]+", None, None).unwrap();

    let mut reader = grammar.reader("xxab").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.id.as_deref(), Some("word"));
    assert_eq!(token.text, "ab");
}

#[test]
fn test_rejectable_with_trailing_context() {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("guarded"), "a+/b", Some(reject_action()), None)
        .unwrap();
    grammar.define_symbol(Some("run"), "a+", None, None).unwrap();

    let mut reader = grammar.rejectable_reader("aaab").unwrap();
    let token = reader.read_token().unwrap();
    // The guarded symbol rejected; the plain run of 'a's is next.
    assert_eq!(token.id.as_deref(), Some("run"));
    assert_eq!(token.text, "aaa");
    assert_eq!(reader.position(), TextSize::new(3));
}
