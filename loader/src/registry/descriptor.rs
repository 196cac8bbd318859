//! Function Descriptors
//!
//! Immutable metadata captured from a module's metadata entry point.

use std::fmt;

use pfunc_bootstrap::{FunctionInfo, ParameterInfo, TypeTag};
use serde::Serialize;

/// One positional parameter of a registered function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    name: String,
    #[serde(rename = "type")]
    type_tag: TypeTag,
    description: String,
}

impl ParameterDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl From<ParameterInfo> for ParameterDescriptor {
    fn from(info: ParameterInfo) -> Self {
        Self {
            name: info.name,
            type_tag: info.type_tag,
            description: info.description,
        }
    }
}

impl fmt::Display for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.type_tag)
        } else {
            write!(f, "{} {}", self.type_tag, self.name)
        }
    }
}

/// Registry metadata for one function. The name is the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDescriptor {
    name: String,
    description: String,
    return_type: TypeTag,
    parameters: Vec<ParameterDescriptor>,
}

impl FunctionDescriptor {
    /// Convert a metadata value; `None` when it carries no usable name.
    pub fn from_info(info: FunctionInfo) -> Option<Self> {
        if info.name.trim().is_empty() {
            return None;
        }
        Some(Self {
            name: info.name,
            description: info.description,
            return_type: info.return_type,
            parameters: info.parameter_infos.into_iter().map(ParameterDescriptor::from).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn return_type(&self) -> TypeTag {
        self.return_type
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    /// `name(type param, ...) -> type`
    pub fn prototype(&self) -> String {
        let params: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        format!("{}({}) -> {}", self.name, params.join(", "), self.return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nameless_info_is_dropped() {
        assert!(FunctionDescriptor::from_info(FunctionInfo::default()).is_none());
        assert!(FunctionDescriptor::from_info(FunctionInfo::new("   ")).is_none());
    }

    #[test]
    fn test_name_is_kept_verbatim() {
        let descriptor = FunctionDescriptor::from_info(FunctionInfo::new(" greet")).unwrap();
        assert_eq!(descriptor.name(), " greet");
    }

    #[test]
    fn test_prototype() {
        let info = FunctionInfo::new("helloWorld")
            .returns(TypeTag::String)
            .parameter(ParameterInfo::new("name", TypeTag::String))
            .parameter(ParameterInfo::new("", TypeTag::Any));
        let descriptor = FunctionDescriptor::from_info(info).unwrap();

        assert_eq!(descriptor.prototype(), "helloWorld(string name, any) -> string");
        assert_eq!(descriptor.parameters().len(), 2);
        assert_eq!(descriptor.parameters()[0].type_tag(), TypeTag::String);
    }

    #[test]
    fn test_serializes_with_camel_case() {
        let descriptor = FunctionDescriptor::from_info(FunctionInfo::new("f").returns(TypeTag::Null)).unwrap();
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["returnType"], "null");
        assert_eq!(value["parameters"], serde_json::json!([]));
    }
}
