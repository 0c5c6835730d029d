//! Hashable key values used to collect key sets and group fetched children.

use indexmap::IndexSet;
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;

use crate::filter::FilterValue;

/// One component of a record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    /// Integer key.
    Int(i64),
    /// String key.
    String(SmolStr),
    /// Boolean key.
    Bool(bool),
}

impl KeyValue {
    /// Convert a field value to a key component.
    ///
    /// Returns `None` for zero values (null, `0`, `""`, `false`) and for
    /// values that cannot act as keys.
    pub fn from_value(value: &FilterValue) -> Option<Self> {
        if value.is_zero() {
            return None;
        }
        match value {
            FilterValue::Int(i) => Some(Self::Int(*i)),
            FilterValue::String(s) => Some(Self::String(SmolStr::new(s))),
            FilterValue::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }
}

impl From<&KeyValue> for FilterValue {
    fn from(key: &KeyValue) -> Self {
        match key {
            KeyValue::Int(i) => Self::Int(*i),
            KeyValue::String(s) => Self::String(s.to_string()),
            KeyValue::Bool(b) => Self::Bool(*b),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::String(s) => write!(f, "{:?}", s.as_str()),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// A single or composite record key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(SmallVec<[KeyValue; 2]>);

impl RecordKey {
    /// Build a key from its components.
    ///
    /// Returns `None` when any component is missing or zero, so records with
    /// incomplete keys never take part in a lookup.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<FilterValue>>,
    {
        values
            .into_iter()
            .map(|v| v.as_ref().and_then(KeyValue::from_value))
            .collect::<Option<SmallVec<_>>>()
            .filter(|parts| !parts.is_empty())
            .map(Self)
    }

    /// Components of the key.
    pub fn parts(&self) -> &[KeyValue] {
        &self.0
    }

    /// Components converted back to filter values.
    pub fn to_values(&self) -> Vec<FilterValue> {
        self.0.iter().map(FilterValue::from).collect()
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.0.as_slice() {
            return write!(f, "{}", single);
        }
        write!(f, "(")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, ")")
    }
}

/// Distinct keys in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    keys: IndexSet<RecordKey>,
}

impl KeySet {
    /// Create an empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; duplicates keep their first position.
    pub fn insert(&mut self, key: RecordKey) -> bool {
        self.keys.insert(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate keys in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &RecordKey> {
        self.keys.iter()
    }

    /// Keys as value tuples, one per key.
    pub fn to_tuples(&self) -> Vec<Vec<FilterValue>> {
        self.keys.iter().map(RecordKey::to_values).collect()
    }
}

impl FromIterator<RecordKey> for KeySet {
    fn from_iter<I: IntoIterator<Item = RecordKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: Vec<FilterValue>) -> Option<RecordKey> {
        RecordKey::from_values(values.into_iter().map(Some))
    }

    #[test]
    fn test_zero_components_are_rejected() {
        assert!(key(vec![FilterValue::Int(0)]).is_none());
        assert!(key(vec![FilterValue::Null]).is_none());
        assert!(key(vec![FilterValue::Int(1), "".into()]).is_none());
        assert!(RecordKey::from_values([Some(FilterValue::Int(1)), None]).is_none());
        assert!(RecordKey::from_values(Vec::<Option<FilterValue>>::new()).is_none());
    }

    #[test]
    fn test_composite_key() {
        let k = key(vec![FilterValue::Int(1), "en".into()]).unwrap();
        assert_eq!(k.len(), 2);
        assert_eq!(k.to_string(), "(1, \"en\")");
        assert_eq!(k.to_values(), vec![FilterValue::Int(1), FilterValue::String("en".into())]);
    }

    #[test]
    fn test_key_set_dedupes_in_order() {
        let mut set = KeySet::new();
        for id in [3, 1, 3, 2, 1] {
            set.insert(key(vec![FilterValue::Int(id)]).unwrap());
        }
        let order: Vec<String> = set.iter().map(|k| k.to_string()).collect();
        assert_eq!(order, vec!["3", "1", "2"]);
        assert_eq!(set.to_tuples().len(), 3);
    }

    #[test]
    fn test_float_is_not_a_key() {
        assert_eq!(KeyValue::from_value(&FilterValue::Float(1.5)), None);
    }
}
