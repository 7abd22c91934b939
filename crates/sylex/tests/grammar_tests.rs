//! Grammar-to-rule lifecycle: named sub-patterns end to end, snapshot
//! isolation of compiled rules, and read-only sharing across threads.

use std::sync::Arc;
use std::thread;

use sylex::lexer::action;
use sylex::{DefinitionError, Grammar};

#[test]
fn test_named_sub_patterns_end_to_end() {
    let mut grammar = Grammar::new();
    grammar.define_regex("digit", "[0-9]").unwrap();
    grammar.define_regex("exponent", "[eE][-+]?{digit}+").unwrap();
    grammar
        .define_symbol(Some("number"), r"{digit}+(\.{digit}+)?{exponent}?", None, None)
        .unwrap();
    grammar
        .define_symbol(None, " +", Some(action::skip_action()), None)
        .unwrap();

    let mut reader = grammar.reader("42 3.14 1e-9 2E+4").unwrap();
    let mut texts = Vec::new();
    loop {
        let token = reader.read_token().unwrap();
        if token.is_eof() {
            break;
        }
        assert_eq!(token.id.as_deref(), Some("number"));
        texts.push(token.text.clone());
    }
    assert_eq!(texts, vec!["42", "3.14", "1e-9", "2E+4"]);
}

#[test]
fn test_readers_keep_their_rule_snapshot() {
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("a"), "a", None, None).unwrap();

    let mut old_reader = grammar.reader("ab").unwrap();

    // Mutating the grammar afterwards does not affect the live reader.
    grammar.define_symbol(Some("b"), "b", None, None).unwrap();
    let mut new_reader = grammar.reader("ab").unwrap();

    assert_eq!(old_reader.read_token().unwrap().text, "a");
    assert!(old_reader.read_token().is_err()); // old snapshot: no "b"

    assert_eq!(new_reader.read_token().unwrap().text, "a");
    assert_eq!(new_reader.read_token().unwrap().text, "b");
}

#[test]
fn test_rule_is_shared_read_only_across_threads() {
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("digits"), "[0-9]+", None, None).unwrap();
    grammar.define_symbol(Some("plus"), r"\+", None, None).unwrap();
    grammar
        .define_symbol(None, r"\s+", Some(action::skip_action()), None)
        .unwrap();
    let rule = grammar.rule().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let rule = Arc::clone(&rule);
            thread::spawn(move || {
                let mut reader = rule.reader("12 + 3");
                let mut count = 0;
                while !reader.read_token().unwrap().is_eof() {
                    count += 1;
                }
                count
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

#[test]
fn test_symbol_count_unchanged_after_failed_definition() {
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("ok"), "a", None, None).unwrap();
    assert_eq!(grammar.symbol_count(), 1);

    assert!(grammar.define_symbol(Some(" bad"), "x", None, None).is_err());
    assert_eq!(grammar.symbol_count(), 1);

    assert!(grammar.define_symbol(None, "(((", None, None).is_err());
    assert_eq!(grammar.symbol_count(), 1);

    assert!(
        grammar
            .define_symbol(None, "<MISSING>x", None, None)
            .is_err()
    );
    assert_eq!(grammar.symbol_count(), 1);
}

#[test]
fn test_anonymous_symbols_report_order() {
    let mut grammar = Grammar::new();
    grammar.define_symbol(None, "[0-9]+", None, None).unwrap();

    let mut reader = grammar.reader("7").unwrap();
    let token = reader.read_token().unwrap();
    assert_eq!(token.id, None);
    assert_eq!(token.order, 0);
}

#[test]
fn test_pre_parsed_pattern_is_used_verbatim() {
    use sylex::pattern::parse_pattern;

    let ast = parse_pattern("[0-9]+").unwrap();
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("digits"), ast, None, None).unwrap();

    let mut reader = grammar.reader("007").unwrap();
    assert_eq!(reader.read_token().unwrap().text, "007");
}

#[test]
fn test_unknown_context_argument_fails_fast() {
    let mut grammar = Grammar::new();
    let err = grammar.define_symbol(None, "a", None, Some(&["NOPE"]));
    assert!(matches!(err, Err(DefinitionError::UnknownContext { .. })));
    assert_eq!(grammar.symbol_count(), 0);
}
