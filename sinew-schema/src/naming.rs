//! Naming conventions used when a relation does not spell out its keys.

use convert_case::{Boundary, Case, Converter};
use smol_str::SmolStr;

/// Convert a model or relation name to snake case.
///
/// Digits stay attached to the preceding word, so `Level2` becomes `level2`
/// and `Level2_1` becomes `level2_1`.
pub fn snake_case(name: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::Underscore, Boundary::LowerUpper, Boundary::Acronym])
        .to_case(Case::Snake)
        .convert(name)
}

/// Default foreign key field for `owner` referencing its `key` field.
///
/// ```rust
/// use sinew_schema::naming::foreign_key;
///
/// assert_eq!(foreign_key("BillingAddress", "id"), "billing_address_id");
/// assert_eq!(foreign_key("Level2", "language_code"), "level2_language_code");
/// ```
pub fn foreign_key(owner: &str, key: &str) -> SmolStr {
    SmolStr::new(format!("{}_{}", snake_case(owner), snake_case(key)))
}

/// Default foreign key fields for every key field of `owner`.
pub fn foreign_keys<'a>(owner: &str, keys: impl IntoIterator<Item = &'a str>) -> Vec<SmolStr> {
    keys.into_iter().map(|key| foreign_key(owner, key)).collect()
}
