//! Domain-specific assertion macros for refile harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear *which* document or field broke an expectation.

use refile::Fields;

/// Assert that a field map has `key` equal to a JSON value.
///
/// ```rust
/// assert_field!(fields, "department", "474");
/// ```
#[macro_export]
macro_rules! assert_field {
    ($fields:expr, $key:expr, $value:expr) => {{
        let fields: &refile::Fields = &$fields;
        let key: &str = $key;
        let expected = serde_json::json!($value);
        match fields.get(key) {
            Some(actual) if *actual == expected => {}
            Some(actual) => panic!(
                "assert_field! failed:\n  fields[{:?}]\n  expected: {}\n  actual:   {}",
                key, expected, actual
            ),
            None => panic!(
                "assert_field! failed: field {:?} not found.\n  Available fields: {:?}",
                key,
                fields.keys().collect::<Vec<_>>()
            ),
        }
    }};
}

/// Assert that the classifier gives `fields` the expected label.
///
/// ```rust
/// assert_label!(classifier, json!({...}), Classification::Madrichim);
/// ```
#[macro_export]
macro_rules! assert_label {
    ($classifier:expr, $value:expr, $expected:expr) => {{
        let fields = $crate::common::fields($value);
        let actual = $classifier.label(&fields);
        let expected: refile::Classification = $expected;
        if actual != expected {
            panic!(
                "assert_label! failed:\n  expected: {}\n  actual:   {}\n  fields: {:?}",
                expected, actual, fields
            );
        }
    }};
}

/// Assert two field maps are equal once `ignored` keys are removed from both.
pub fn assert_fields_eq_except(left: &Fields, right: &Fields, ignored: &[&str]) {
    let strip = |f: &Fields| {
        let mut f = f.clone();
        for key in ignored {
            f.remove(*key);
        }
        f
    };
    pretty_assertions::assert_eq!(strip(left), strip(right));
}
