//! Property tests for evaluation using proptest.
//!
//! Key properties:
//!
//! 1. Every application form (`f a b`, `f a, b`, `a .f b`, `a |> f b`)
//!    computes the same value
//! 2. Currying: supplying arguments in several calls equals supplying them
//!    in one call
//! 3. A range `lo..hi` yields `hi - lo + 1` ascending elements, or none
//! 4. `map` preserves length and order
//! 5. The layout of a program does not change its value when only blank
//!    lines and comments are added

use std::rc::Rc;

use proptest::prelude::*;

use crate::value::Value;

fn eval(source: &str) -> Rc<Value> {
    let mut output = Vec::new();
    match crate::run(source, &mut output) {
        Ok(value) => value,
        Err(err) => panic!("{source:?} failed: {err}"),
    }
}

fn numbers(values: impl IntoIterator<Item = i64>) -> Rc<Value> {
    Value::list(values.into_iter().map(Value::number).collect())
}

fn arb_small() -> impl Strategy<Value = i64> {
    -1000i64..1000
}

proptest! {
    #[test]
    fn application_forms_agree(a in arb_small(), b in arb_small()) {
        let prelude = "sub := fn x y -> x - y\n";
        let expected = Value::number(a - b);
        for call in [
            format!("sub ({a}) ({b})"),
            format!("sub ({a}), ({b})"),
            format!("({a}) .sub ({b})"),
            format!("({a}) |> sub ({b})"),
        ] {
            prop_assert_eq!(eval(&format!("{prelude}{call}")), expected.clone());
        }
    }

    #[test]
    fn currying_is_associative(a in arb_small(), b in arb_small(), c in arb_small()) {
        let prelude = "f := fn x y z -> x * 10000 + y * 100 + z\n";
        let expected = eval(&format!("{prelude}f ({a}) ({b}) ({c})"));
        prop_assert_eq!(eval(&format!("{prelude}(f ({a})) ({b}) ({c})")), expected.clone());
        prop_assert_eq!(eval(&format!("{prelude}((f ({a})) ({b})) ({c})")), expected.clone());
        prop_assert_eq!(eval(&format!("{prelude}g := f ({a}) ({b})\ng ({c})")), expected);
    }

    #[test]
    fn ranges_yield_ascending_elements(low in -50i64..50, high in -50i64..50) {
        let value = eval(&format!("({low})..({high}) .map fn x -> x"));
        prop_assert_eq!(value, numbers(low..=high));

        let len = eval(&format!("len (({low})..({high}))"));
        prop_assert_eq!(len, Value::number((high - low + 1).max(0)));
    }

    #[test]
    fn map_preserves_length_and_order(values in prop::collection::vec(arb_small(), 0..20)) {
        let literal = values
            .iter()
            .map(|value| format!("({value})"))
            .collect::<Vec<_>>()
            .join(", ");
        let value = eval(&format!("[{literal}] .map fn x -> x * 2"));
        prop_assert_eq!(value, numbers(values.iter().map(|value| value * 2)));
    }

    #[test]
    fn blank_lines_and_comments_do_not_change_layout(a in arb_small(), gaps in 0usize..3) {
        let gap = "\n# note\n".repeat(gaps);
        let plain = format!("f := fn x ->\n    y := x + 1\n    y * 2\nf ({a})");
        let spaced = format!("f := fn x ->\n{gap}    y := x + 1\n{gap}    y * 2\n{gap}f ({a})");
        prop_assert_eq!(eval(&spaced), eval(&plain));
    }
}
