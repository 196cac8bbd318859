//! Function Metadata
//!
//! Descriptor-like values returned by a module's metadata entry point. The
//! serialized property names (`name`, `description`, `returnType`,
//! `parameterInfos`, and `type` on parameters) are part of the contract.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Semantic type tag for parameters and return values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Null,
    /// Also the reading of any tag this version does not know.
    #[default]
    #[serde(other)]
    Any,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Integer => "integer",
            TypeTag::Number => "number",
            TypeTag::Boolean => "boolean",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Null => "null",
            TypeTag::Any => "any",
        }
    }

    /// Best-effort tag for a Rust type.
    pub fn of<T: ?Sized>() -> Self {
        let name = std::any::type_name::<T>();
        match name {
            "alloc::string::String" | "str" | "&str" | "char" => TypeTag::String,
            "bool" => TypeTag::Boolean,
            "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
            | "u128" | "usize" => TypeTag::Integer,
            "f32" | "f64" => TypeTag::Number,
            "()" => TypeTag::Null,
            _ if name.starts_with("alloc::vec::Vec<") || name.starts_with('[') => TypeTag::Array,
            _ if name.starts_with("std::collections::hash::map::HashMap<")
                || name.starts_with("alloc::collections::btree::map::BTreeMap<")
                || name == "serde_json::map::Map<alloc::string::String, serde_json::value::Value>" =>
            {
                TypeTag::Object
            }
            _ => TypeTag::Any,
        }
    }

    /// Tag describing a concrete JSON value.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Boolean,
            Value::Number(n) if n.is_f64() => TypeTag::Number,
            Value::Number(_) => TypeTag::Integer,
            Value::String(_) => TypeTag::String,
            Value::Array(_) => TypeTag::Array,
            Value::Object(_) => TypeTag::Object,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one positional parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub type_tag: TypeTag,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            type_tag,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Metadata for one function offered by a module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub return_type: TypeTag,
    #[serde(default)]
    pub parameter_infos: Vec<ParameterInfo>,
}

impl FunctionInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn returns(mut self, type_tag: TypeTag) -> Self {
        self.return_type = type_tag;
        self
    }

    pub fn parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameter_infos.push(parameter);
        self
    }
}
