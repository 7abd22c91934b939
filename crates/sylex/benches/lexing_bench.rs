use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use sylex::lexer::action;
use sylex::Grammar;

fn arithmetic_grammar() -> Grammar {
    let mut grammar = Grammar::new();
    grammar
        .define_symbol(Some("number"), r"[0-9]+(\.[0-9]+)?", None, None)
        .unwrap();
    grammar.define_symbol(Some("ident"), "[a-z_][a-z0-9_]*", None, None).unwrap();
    grammar.define_symbol(Some("plus"), r"\+", None, None).unwrap();
    grammar.define_symbol(Some("minus"), "-", None, None).unwrap();
    grammar.define_symbol(Some("star"), r"\*", None, None).unwrap();
    grammar.define_symbol(Some("lparen"), r"\(", None, None).unwrap();
    grammar.define_symbol(Some("rparen"), r"\)", None, None).unwrap();
    grammar
        .define_symbol(None, r"\s+", Some(action::skip_action()), None)
        .unwrap();
    grammar
}

fn bench_tokenize(c: &mut Criterion) {
    let mut grammar = arithmetic_grammar();
    let rule = grammar.rule().unwrap();
    let input = "x1 + 42 * (y_2 - 3.14) + foo * 100 ".repeat(64);

    c.bench_function("tokenize_arithmetic", |b| {
        b.iter(|| {
            let mut reader = Arc::clone(&rule).reader(black_box(&input));
            let mut count = 0usize;
            while !reader.read_token().unwrap().is_eof() {
                count += 1;
            }
            black_box(count)
        });
    });
}

fn bench_trailing(c: &mut Criterion) {
    let mut grammar = Grammar::new();
    grammar.define_symbol(Some("stmt"), "[a-z]+/;", None, None).unwrap();
    grammar.define_symbol(Some("semi"), ";", None, None).unwrap();
    grammar
        .define_symbol(None, r"\s+", Some(action::skip_action()), None)
        .unwrap();
    let rule = grammar.rule().unwrap();
    let input = "word; other; thing; ".repeat(128);

    c.bench_function("tokenize_trailing_context", |b| {
        b.iter(|| {
            let mut reader = Arc::clone(&rule).reader(black_box(&input));
            let mut count = 0usize;
            while !reader.read_token().unwrap().is_eof() {
                count += 1;
            }
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_tokenize, bench_trailing);
criterion_main!(benches);
