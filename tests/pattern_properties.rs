//! Property-based tests for the pattern DSL, the finder and the caster
//!
//! These check the universally quantified guarantees of the core:
//! - an escaped string always matches itself literally
//! - unsigned integers survive capture and cast unchanged
//! - casting is idempotent and keeps the shape of nested sequences

use autoio::autoparse::find::{first_capture, has_match};
use autoio::autoparse::pattern::{capturing, escape, UNSIGNED_INTEGER};
use autoio::autoparse::{cast, Capture, Value};
use proptest::prelude::*;

/// Strings rich in regex metacharacters
fn metachar_heavy_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        r"[.*+?()\[\]{}|^$\\#&~ -]{1,12}",
        "[a-z.*()+]{0,12}",
        any::<String>(),
    ]
}

/// Literals that cast to something other than a string, or to a string that
/// cannot be mistaken for one of the special float spellings
fn castable_token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[0-9.+eEdD-]{0,8}",
        "(true|false|none|TRUE|None)",
        "[b-h]{1,5}",
    ]
}

proptest! {
    #[test]
    fn escaped_string_matches_itself(s in metachar_heavy_strategy()) {
        prop_assert!(has_match(&escape(&s), &s).unwrap());
    }

    #[test]
    fn escaped_string_is_captured_verbatim(s in "[a-z.*()+?$^|\\[\\]]{1,10}") {
        let subject = format!("<<{}>>", s);
        let captured = first_capture(&capturing(&escape(&s)), &subject).unwrap();
        prop_assert_eq!(captured, Some(Capture::Single(s)));
    }

    #[test]
    fn unsigned_integers_capture_and_cast(n in 0i64..=i64::MAX) {
        let text = n.to_string();
        let captured = first_capture(&capturing(&UNSIGNED_INTEGER), &text).unwrap().unwrap();
        prop_assert_eq!(captured.as_single(), Some(text.as_str()));
        prop_assert_eq!(cast(&captured), Value::Int(n));
    }

    #[test]
    fn cast_is_idempotent(tokens in prop::collection::vec(castable_token_strategy(), 0..6)) {
        let once = cast(&tokens);
        prop_assert_eq!(cast(&once), once);
    }

    #[test]
    fn cast_preserves_nesting(
        rows in prop::collection::vec(prop::collection::vec(castable_token_strategy(), 0..4), 0..4)
    ) {
        let value = cast(&rows);
        let outer = value.as_seq().unwrap();
        prop_assert_eq!(outer.len(), rows.len());
        for (row, cast_row) in rows.iter().zip(outer) {
            prop_assert_eq!(cast_row.as_seq().map(<[Value]>::len), Some(row.len()));
        }
    }
}
