//! Argument Normalisation
//!
//! Callers may pass nothing, a single bare value, or a sequence; the bridge
//! always hands the module a sequence.

use serde_json::Value;

/// Positional arguments for one invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `null` is no arguments, an array is the arguments, anything else is one argument.
impl From<Value> for Arguments {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::Array(values) => Self(values),
            other => Self(vec![other]),
        }
    }
}

impl From<Option<Vec<Value>>> for Arguments {
    fn from(values: Option<Vec<Value>>) -> Self {
        Self(values.unwrap_or_default())
    }
}

impl From<Vec<Value>> for Arguments {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl From<Vec<String>> for Arguments {
    fn from(values: Vec<String>) -> Self {
        Self(values.into_iter().map(Value::String).collect())
    }
}

impl From<&[&str]> for Arguments {
    fn from(values: &[&str]) -> Self {
        Self(values.iter().map(|s| Value::from(*s)).collect())
    }
}

impl From<&str> for Arguments {
    fn from(value: &str) -> Self {
        Self(vec![Value::from(value)])
    }
}

impl From<String> for Arguments {
    fn from(value: String) -> Self {
        Self(vec![Value::String(value)])
    }
}

impl From<()> for Arguments {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_empty() {
        assert_eq!(Arguments::from(Value::Null), Arguments::from(Vec::<Value>::new()));
        assert_eq!(Arguments::from(None::<Vec<Value>>), Arguments::default());
        assert!(Arguments::from(()).is_empty());
    }

    #[test]
    fn test_bare_value_is_wrapped() {
        assert_eq!(Arguments::from("x"), Arguments::from(vec![json!("x")]));
        assert_eq!(Arguments::from(json!(3)).into_vec(), vec![json!(3)]);
        assert_eq!(Arguments::from(json!({"k": 1})).len(), 1);
    }

    #[test]
    fn test_array_is_the_arguments() {
        let args = Arguments::from(json!(["a", 2]));
        assert_eq!(args.as_slice(), &[json!("a"), json!(2)]);
        let strings = Arguments::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(strings, Arguments::from(&["a", "b"][..]));
    }
}
