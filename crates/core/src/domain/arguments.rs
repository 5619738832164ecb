// Argument Store - job arguments, lazily materialized from their serialized form

use crate::domain::error::ArgumentError;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Keys with this prefix are reserved for framework markers inside argument maps
pub const RESERVED_KEY_PREFIX: &str = "_aj_";

/// Keyed options passed after the positional arguments
pub type Options = BTreeMap<String, Argument>;

/// A materialized job argument
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Argument>),
    Map(Options),
}

impl Argument {
    /// Convert one serialized JSON value
    pub fn from_value(value: &Value) -> Result<Self, ArgumentError> {
        Ok(match value {
            Value::Null => Argument::Null,
            Value::Bool(b) => Argument::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Argument::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Argument::Float(f)
                } else {
                    return Err(ArgumentError::UnsupportedNumber(n.to_string()));
                }
            }
            Value::String(s) => Argument::String(s.clone()),
            Value::Array(items) => Argument::List(
                items
                    .iter()
                    .map(Argument::from_value)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut options = Options::new();
                for (key, value) in map {
                    check_key(key)?;
                    options.insert(key.clone(), Argument::from_value(value)?);
                }
                Argument::Map(options)
            }
        })
    }

    /// Convert back into the serialized JSON form
    pub fn to_value(&self) -> Result<Value, ArgumentError> {
        Ok(match self {
            Argument::Null => Value::Null,
            Argument::Bool(b) => Value::Bool(*b),
            Argument::Int(i) => Value::Number((*i).into()),
            Argument::Float(f) => Value::Number(
                Number::from_f64(*f)
                    .ok_or_else(|| ArgumentError::UnsupportedNumber(f.to_string()))?,
            ),
            Argument::String(s) => Value::String(s.clone()),
            Argument::List(items) => Value::Array(
                items
                    .iter()
                    .map(Argument::to_value)
                    .collect::<Result<_, _>>()?,
            ),
            Argument::Map(options) => {
                let mut map = Map::new();
                for (key, value) in options {
                    check_key(key)?;
                    map.insert(key.clone(), value.to_value()?);
                }
                Value::Object(map)
            }
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Argument::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Argument::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Argument::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Options> {
        match self {
            Argument::Map(options) => Some(options),
            _ => None,
        }
    }
}

fn check_key(key: &str) -> Result<(), ArgumentError> {
    if key.starts_with(RESERVED_KEY_PREFIX) {
        return Err(ArgumentError::ReservedKey(key.to_string()));
    }
    Ok(())
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::String(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::String(s)
    }
}

impl From<i64> for Argument {
    fn from(i: i64) -> Self {
        Argument::Int(i)
    }
}

impl From<i32> for Argument {
    fn from(i: i32) -> Self {
        Argument::Int(i.into())
    }
}

impl From<f64> for Argument {
    fn from(f: f64) -> Self {
        Argument::Float(f)
    }
}

impl From<bool> for Argument {
    fn from(b: bool) -> Self {
        Argument::Bool(b)
    }
}

impl From<Vec<Argument>> for Argument {
    fn from(items: Vec<Argument>) -> Self {
        Argument::List(items)
    }
}

impl From<Options> for Argument {
    fn from(options: Options) -> Self {
        Argument::Map(options)
    }
}

/// Remove a trailing options map from `args` and return it.
///
/// Returns an empty map when the last argument is not a map. The order of
/// the remaining positional arguments is left untouched.
pub fn extract_trailing_options(args: &mut Vec<Argument>) -> Options {
    match args.last() {
        Some(Argument::Map(_)) => match args.pop() {
            Some(Argument::Map(options)) => options,
            _ => Options::new(),
        },
        _ => Options::new(),
    }
}

/// A job's arguments, either still serialized or already materialized
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentStore {
    Serialized(Value),
    Materialized(Vec<Argument>),
}

impl Default for ArgumentStore {
    fn default() -> Self {
        ArgumentStore::Materialized(Vec::new())
    }
}

impl From<Vec<Argument>> for ArgumentStore {
    fn from(args: Vec<Argument>) -> Self {
        ArgumentStore::Materialized(args)
    }
}

impl ArgumentStore {
    pub fn serialized(raw: Value) -> Self {
        ArgumentStore::Serialized(raw)
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, ArgumentStore::Materialized(_))
    }

    /// Materialized values, or `None` while still serialized
    pub fn values(&self) -> Option<&[Argument]> {
        match self {
            ArgumentStore::Materialized(args) => Some(args),
            ArgumentStore::Serialized(_) => None,
        }
    }

    /// Convert the serialized payload into arguments.
    ///
    /// Runs the conversion at most once; later calls return the cached
    /// values. On failure the store stays serialized.
    pub fn materialize(&mut self) -> Result<&[Argument], ArgumentError> {
        if let ArgumentStore::Serialized(raw) = self {
            let items = raw
                .as_array()
                .ok_or_else(|| ArgumentError::NotAnArray(json_type_name(raw).to_string()))?;
            let args = items
                .iter()
                .map(Argument::from_value)
                .collect::<Result<Vec<_>, _>>()?;
            debug!(count = args.len(), "Arguments materialized");
            *self = ArgumentStore::Materialized(args);
        }
        Ok(self.values().unwrap_or_default())
    }

    /// Split a copy of the arguments into positional values and trailing options
    pub fn split_options(&self) -> Result<(Vec<Argument>, Options), ArgumentError> {
        let mut positional = self
            .values()
            .ok_or(ArgumentError::NotMaterialized)?
            .to_vec();
        let options = extract_trailing_options(&mut positional);
        Ok((positional, options))
    }

    /// Serialized JSON array form of the arguments
    pub fn serialize(&self) -> Result<Value, ArgumentError> {
        match self {
            ArgumentStore::Serialized(raw) => Ok(raw.clone()),
            ArgumentStore::Materialized(args) => Ok(Value::Array(
                args.iter()
                    .map(Argument::to_value)
                    .collect::<Result<_, _>>()?,
            )),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_materialize_converts_once() {
        let mut store = ArgumentStore::serialized(json!(["mike", 3, 1.5, true, null]));
        assert!(!store.is_materialized());

        let first = store.materialize().unwrap().to_vec();
        assert_eq!(
            first,
            vec![
                Argument::from("mike"),
                Argument::Int(3),
                Argument::Float(1.5),
                Argument::Bool(true),
                Argument::Null,
            ]
        );

        let snapshot = store.clone();
        let second = store.materialize().unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(store, snapshot);
    }

    #[test]
    fn test_materialize_rejects_non_array() {
        let mut store = ArgumentStore::serialized(json!({"name": "mike"}));
        let err = store.materialize().unwrap_err();

        assert_eq!(err, ArgumentError::NotAnArray("object".to_string()));
        assert!(!store.is_materialized());
    }

    #[test]
    fn test_materialize_rejects_reserved_keys() {
        let mut store = ArgumentStore::serialized(json!([{"_aj_globalid": "gid://app/User/1"}]));
        assert_eq!(
            store.materialize().unwrap_err(),
            ArgumentError::ReservedKey("_aj_globalid".to_string())
        );
    }

    #[test]
    fn test_extract_trailing_options() {
        let mut args = vec![Argument::from("mike")];
        assert!(extract_trailing_options(&mut args).is_empty());
        assert_eq!(args, vec![Argument::from("mike")]);

        let mut options = Options::new();
        options.insert("priority".to_string(), Argument::from("high"));
        let mut args = vec![
            Argument::from("mike"),
            Argument::Int(7),
            Argument::Map(options.clone()),
        ];
        assert_eq!(extract_trailing_options(&mut args), options);
        assert_eq!(args, vec![Argument::from("mike"), Argument::Int(7)]);
    }

    #[test]
    fn test_leading_map_is_positional() {
        let mut options = Options::new();
        options.insert("a".to_string(), Argument::Int(1));
        let mut args = vec![Argument::Map(options.clone()), Argument::from("tail")];

        assert!(extract_trailing_options(&mut args).is_empty());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_split_options_leaves_store_intact() {
        let mut store = ArgumentStore::serialized(json!(["mike", {"priority": "high"}]));
        assert_eq!(
            store.split_options().unwrap_err(),
            ArgumentError::NotMaterialized
        );

        store.materialize().unwrap();
        let (positional, options) = store.split_options().unwrap();

        assert_eq!(positional, vec![Argument::from("mike")]);
        assert_eq!(options.get("priority"), Some(&Argument::from("high")));
        assert_eq!(store.values().map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_serialize_materialized_arguments() {
        let store = ArgumentStore::from(vec![Argument::from("a"), Argument::Int(2)]);
        assert_eq!(store.serialize().unwrap(), json!(["a", 2]));

        let raw = json!(["untouched", {"k": 1}]);
        assert_eq!(ArgumentStore::serialized(raw.clone()).serialize().unwrap(), raw);

        let store = ArgumentStore::from(vec![Argument::Float(f64::NAN)]);
        assert!(matches!(
            store.serialize(),
            Err(ArgumentError::UnsupportedNumber(_))
        ));
    }
}
