//! Randomized checks of the whole pipeline.

use novac::compressor::{Compressor, ReduceOptions};
use novac::parser::{Mode, parse};
use novac::{compile, compile_lenient};
use proptest::prelude::*;

const ARITHMETIC: [&str; 10] = ["+", "-", "*", "/", "%", "&", "|", "^", "<<", ">>"];

/// Fully parenthesized arithmetic, so the emitted text is the source minus spaces.
fn arb_arithmetic(max_depth: u32) -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        "[a-z]{1,3}",
    ];

    leaf.prop_recursive(max_depth, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(ARITHMETIC.to_vec()), inner.clone())
                .prop_map(|(left, op, right)| format!("({} {} {})", left, op, right)),
            inner.prop_map(|operand| format!("~({})", operand)),
        ]
    })
}

fn arb_token_soup() -> impl Strategy<Value = String> {
    let piece = prop::sample::select(vec![
        "a", "b", "#g", "f", "1", "42", "(", ")", ",", "=", "?", ":", "+", "-", "*", "**", "<", ">=", "==", "!=",
        "&&", "||", ">>>", "~", "!", "; note", "\n", " ",
    ]);
    prop::collection::vec(piece, 0..40).prop_map(|pieces| pieces.concat())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn lenient_pipeline_never_panics_on_printable_text(source in "[ -~\n]{0,64}") {
        let _ = compile_lenient(&source);
    }

    #[test]
    fn lenient_parse_always_yields_a_program(source in arb_token_soup()) {
        prop_assert!(parse(&source, Mode::Lenient).is_ok());
        let _ = compile_lenient(&source);
    }

    #[test]
    fn arithmetic_passes_through_unchanged(expression in arb_arithmetic(4)) {
        let source = format!("x = {}", expression);
        let output = compile(&source).unwrap();
        prop_assert_eq!(output, format!("set \"x={}\"\n", expression.replace(' ', "")));
    }

    #[test]
    fn reduce_leaves_arithmetic_programs_alone(first in arb_arithmetic(3), second in arb_arithmetic(3)) {
        let program = parse(&format!("p = {}\nf(a, b) = {} + a * b", first, second), Mode::Strict).unwrap();
        let mut compressor = Compressor::new(&program);
        compressor.reduce(&ReduceOptions::default()).unwrap();
        prop_assert_eq!(compressor.program(), program);
        prop_assert!(compressor.added_symbols().is_empty());
    }

    #[test]
    fn comparisons_never_reach_the_output(left in arb_arithmetic(2), right in arb_arithmetic(2)) {
        let output = compile(&format!("x = {} < {} ? {} : {}", left, right, right, left)).unwrap();
        prop_assert_eq!(output.lines().count(), 1);
        prop_assert!(!output.contains('?'));
        prop_assert!(!output.replace("<<", "").contains('<'));
    }
}
