//! Raw query-string values and their typed, coerced counterparts.

use indexmap::IndexMap;
use indexmap::map::Entry;
use sea_orm::Value;

/// One query-string value as received: a single string, or an array when the
/// key was repeated (`school=1&school=2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    One(String),
    Many(Vec<String>),
}

impl RawValue {
    /// Elements of a multi-valued parameter, trimmed, with empty ones skipped.
    ///
    /// A single string is split on commas; a repeated key is used as is.
    pub fn elements(&self) -> Vec<&str> {
        let parts: Vec<&str> = match self {
            Self::One(value) => value.split(',').collect(),
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect()
    }

    /// The value used by single-valued parameters (first one when repeated).
    pub fn first(&self) -> &str {
        match self {
            Self::One(value) => value,
            Self::Many(values) => values.first().map_or("", String::as_str),
        }
    }

    /// The original text, for error messages.
    pub fn as_text(&self) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join(","),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::One(existing) => {
                *self = Self::Many(vec![std::mem::take(existing), value]);
            }
            Self::Many(values) => values.push(value),
        }
    }
}

/// URL-decoded query parameters in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams(IndexMap<String, RawValue>);

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group query pairs by key; repeated keys become [`RawValue::Many`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            match params.0.entry(key.into()) {
                Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
                Entry::Vacant(entry) => {
                    entry.insert(RawValue::One(value.into()));
                }
            }
        }
        params
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for RawParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// A coerced filter value element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// The bound parameter for this value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(value) => Value::from(*value),
            Self::Bool(value) => Value::from(*value),
            Self::Text(value) => Value::from(value.clone()),
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A normalized filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Single(Scalar),
    List(Vec<Scalar>),
}

impl FilterValue {
    /// View single values as a one-element list.
    pub fn as_slice(&self) -> &[Scalar] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::List(values) => values,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

/// How the elements of a multi-valued tag filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    /// Matches any of the values
    #[default]
    Or,
    /// Matches all of the values
    And,
}

impl Logic {
    /// `and` (any case) selects [`Logic::And`]; anything else is [`Logic::Or`].
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("and") {
            Self::And
        } else {
            Self::Or
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_become_arrays() {
        let params = RawParams::from_pairs([("school", "1"), ("name", "fire"), ("school", "2")]);
        assert_eq!(
            params.get("school"),
            Some(&RawValue::Many(vec!["1".to_string(), "2".to_string()]))
        );
        assert_eq!(params.get("name"), Some(&RawValue::One("fire".to_string())));
        let keys: Vec<&str> = params.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["school", "name"]);
    }

    #[test]
    fn test_elements_split_and_trim() {
        let value = RawValue::One(" 1, 2,,3 ".to_string());
        assert_eq!(value.elements(), vec!["1", "2", "3"]);
        assert!(RawValue::One(String::new()).elements().is_empty());
    }

    #[test]
    fn test_logic_parse_is_lenient() {
        assert_eq!(Logic::parse("and"), Logic::And);
        assert_eq!(Logic::parse("AND"), Logic::And);
        assert_eq!(Logic::parse("or"), Logic::Or);
        assert_eq!(Logic::parse("xor"), Logic::Or);
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(Scalar::Int(7).to_value(), Value::from(7i64));
        assert_eq!(Scalar::from("fire").to_value(), Value::from("fire".to_string()));
        assert_eq!(Scalar::Bool(true).to_value(), Value::from(true));
    }
}
