//! Per-column cleaning rules for listing records.
//!
//! Every rule is total: a value that fails its rule becomes null, it never fails the row.
//! Null inputs stay null.

use crate::execution::ExecutionEngine;
use crate::listing::{
    ADDRESS, ADDRESS_CLEAN, CUISINES, CUISINE_1, CUISINE_2, DISH_1, DISH_2, DISH_LIKED, NAME, PHONE,
    REVIEWS_LIST, REVIEW_1, REVIEW_2,
};
use crate::types::{DataSet, DataType, Field, Value};

/// Minimum number of digits in a valid phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Strip one leading `+` and all whitespace; keep the result only if it is at least
/// [`MIN_PHONE_DIGITS`] ASCII digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let stripped: String = raw
        .strip_prefix('+')
        .unwrap_or(raw)
        .chars()
        .filter(|c| !is_pattern_space(*c))
        .collect();
    (stripped.len() >= MIN_PHONE_DIGITS && stripped.bytes().all(|b| b.is_ascii_digit()))
        .then_some(stripped)
}

/// A name survives only if it has no digits and is longer than two characters.
pub fn validate_name(raw: &str) -> Option<String> {
    if raw.chars().any(|c| c.is_ascii_digit()) || raw.chars().count() <= 2 {
        return None;
    }
    Some(raw.to_string())
}

/// Keep ASCII alphanumerics and whitespace, then drop newlines.
pub fn clean_address(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || is_pattern_space(*c))
        .filter(|c| *c != '\n')
        .collect()
}

/// Drop newlines, plus the list brackets around the reviews column.
pub fn strip_multi_value(raw: &str, brackets: bool) -> String {
    raw.chars()
        .filter(|c| *c != '\n' && !(brackets && matches!(c, '[' | ']')))
        .collect()
}

/// The first and second `,`-separated segments, untrimmed. A missing segment is `None`.
pub fn split_pair(raw: &str) -> (Option<String>, Option<String>) {
    let mut parts = raw.split(',');
    (
        parts.next().map(str::to_string),
        parts.next().map(str::to_string),
    )
}

/// Remove quote and parenthesis noise from the first review segment.
pub fn clean_first_review(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '"' | '\'' | '(' | ')'))
        .collect()
}

/// Remove quotes, backslashes and literal `\n` escapes from the second review segment.
pub fn clean_second_review(raw: &str) -> String {
    raw.replace("\\n", "")
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '\\'))
        .collect()
}

// Matches the `\s` class of the source data's regex dialect.
fn is_pattern_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Apply every cleaning rule and add the derived columns.
///
/// `phone`, `name`, `reviews_list`, `dish_liked` and `cuisines` are replaced in place;
/// `address_clean`, `review_1/2`, `dish_1/2` and `cuisine_1/2` are appended. Columns absent
/// from the input produce null derived values.
pub fn normalize(engine: &ExecutionEngine, dataset: &DataSet) -> DataSet {
    let ds = derive_text(engine, dataset, PHONE, PHONE, normalize_phone);
    let ds = derive_text(engine, &ds, ADDRESS, ADDRESS_CLEAN, |s| Some(clean_address(s)));

    let ds = derive_text(engine, &ds, REVIEWS_LIST, REVIEWS_LIST, |s| {
        Some(strip_multi_value(s, true))
    });
    let ds = derive_text(engine, &ds, REVIEWS_LIST, REVIEW_1, |s| {
        split_pair(s).0.map(|r| clean_first_review(&r))
    });
    let ds = derive_text(engine, &ds, REVIEWS_LIST, REVIEW_2, |s| {
        split_pair(s).1.map(|r| clean_second_review(&r))
    });

    let ds = derive_pair(engine, &ds, DISH_LIKED, DISH_1, DISH_2);
    let ds = derive_pair(engine, &ds, CUISINES, CUISINE_1, CUISINE_2);

    derive_text(engine, &ds, NAME, NAME, validate_name)
}

fn derive_pair(
    engine: &ExecutionEngine,
    dataset: &DataSet,
    source: &str,
    first: &str,
    second: &str,
) -> DataSet {
    let ds = derive_text(engine, dataset, source, source, |s| {
        Some(strip_multi_value(s, false))
    });
    let ds = derive_text(engine, &ds, source, first, |s| split_pair(s).0);
    derive_text(engine, &ds, source, second, |s| split_pair(s).1)
}

fn derive_text<F>(
    engine: &ExecutionEngine,
    dataset: &DataSet,
    source: &str,
    target: &str,
    rule: F,
) -> DataSet
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    let idx = dataset.schema.index_of(source);
    engine.with_column_parallel(dataset, Field::new(target, DataType::Utf8), |row| {
        match idx.and_then(|i| row.get(i)) {
            Some(Value::Utf8(s)) => Value::from_opt(rule(s)),
            _ => Value::Null,
        }
    })
}
