// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for scalar evaluation

use proptest::prelude::*;
use sift_expr::{compare_values, evaluate, ArithOp, CompareOp, EvalError, Expr, Value};

fn arb_int_op() -> impl Strategy<Value = (ArithOp, fn(i64, i64) -> Option<i64>)> {
    prop_oneof![
        Just((ArithOp::Add, i64::checked_add as fn(i64, i64) -> Option<i64>)),
        Just((ArithOp::Subtract, i64::checked_sub as fn(i64, i64) -> Option<i64>)),
        Just((ArithOp::Multiply, i64::checked_mul as fn(i64, i64) -> Option<i64>)),
    ]
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z]{0,6}".prop_map(Value::Str),
    ]
}

proptest! {
    #[test]
    fn test_integer_arithmetic_is_checked((op, checked) in arb_int_op(), a in any::<i64>(), b in any::<i64>()) {
        let result = evaluate(&Expr::constant(a).arith(op, b));
        match checked(a, b) {
            Some(expected) => prop_assert_eq!(result, Ok(Value::Int(expected))),
            None => prop_assert_eq!(result, Err(EvalError::Overflow(op.symbol()))),
        }
    }

    #[test]
    fn test_integer_division_by_zero(a in any::<i64>()) {
        for op in [ArithOp::Divide, ArithOp::Remainder] {
            prop_assert_eq!(evaluate(&Expr::constant(a).arith(op, 0)), Err(EvalError::DivisionByZero));
        }
    }

    #[test]
    fn test_ordering_is_antisymmetric(a in arb_scalar(), b in arb_scalar()) {
        let pairs = [
            (CompareOp::LessThan, CompareOp::GreaterThan),
            (CompareOp::LessThanOrEqual, CompareOp::GreaterThanOrEqual),
            (CompareOp::Equal, CompareOp::Equal),
            (CompareOp::NotEqual, CompareOp::NotEqual),
        ];
        for (op, mirrored) in pairs {
            prop_assert_eq!(compare_values(op, &a, &b), compare_values(mirrored, &b, &a));
        }
    }

    #[test]
    fn test_not_equal_negates_equal(a in arb_scalar(), b in arb_scalar()) {
        let eq = compare_values(CompareOp::Equal, &a, &b);
        let ne = compare_values(CompareOp::NotEqual, &a, &b);
        prop_assert_eq!(eq.map(|x| !x), ne);
    }

    #[test]
    fn test_integers_and_floats_compare_numerically(a in -1_000_000i64..1_000_000) {
        let above = Value::Float(a as f64 + 0.5);
        prop_assert_eq!(compare_values(CompareOp::LessThan, &Value::Int(a), &above), Some(true));
        prop_assert_eq!(compare_values(CompareOp::Equal, &Value::Int(a), &Value::Float(a as f64)), Some(true));
    }

    #[test]
    fn test_lowercasing_is_idempotent(s in "[A-Za-z ]{0,12}") {
        let once = evaluate(&Expr::constant(s.as_str()).call("to_lower", vec![])).unwrap();
        let twice = evaluate(&Expr::constant(once.clone()).call("to_lower", vec![])).unwrap();
        prop_assert_eq!(once, twice);
    }
}
