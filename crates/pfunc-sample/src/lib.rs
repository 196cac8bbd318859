//! Sample pfunc module.
//!
//! Linked as an rlib it registers itself in the compiled-in registry; built as
//! a cdylib with the `native` feature it exports the same bootstrap through the
//! native ABI.

use std::sync::Arc;

use pfunc_bootstrap::{
    argument, Bootstrap, BootstrapError, FunctionInfo, ParameterInfo, StaticModule, TypeTag, Value,
};
#[cfg(feature = "native")]
use pfunc_bootstrap::{export_bootstrap, export_manifest};

pub const ENTRY_POINT: &str = "pfunc_sample_bootstrap";
pub const MANIFEST: &str = "bootstrap = pfunc_sample_bootstrap\n";

pub fn hello_world(name: Option<&str>) -> String {
    format!("Hello {}", name.unwrap_or("null"))
}

#[derive(Debug, Default)]
pub struct SampleBootstrap;

impl Bootstrap for SampleBootstrap {
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, BootstrapError> {
        match name {
            "helloWorld" => {
                let who: Option<String> = argument(args, 0)?;
                Ok(Value::String(hello_world(who.as_deref())))
            }
            _ => Err(BootstrapError::UnknownFunction(name.to_string())),
        }
    }

    fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
        Ok(vec![FunctionInfo::new("helloWorld")
            .with_description("Greets the given name")
            .returns(TypeTag::String)
            .parameter(ParameterInfo::new("name", TypeTag::String))])
    }
}

fn sample_bootstrap() -> Arc<dyn Bootstrap> {
    Arc::new(SampleBootstrap)
}

inventory::submit! {
    StaticModule {
        name: "pfunc-sample",
        manifest: Some(MANIFEST),
        entry_points: &[(ENTRY_POINT, sample_bootstrap)],
    }
}

#[cfg(feature = "native")]
export_manifest!(MANIFEST);
#[cfg(feature = "native")]
export_bootstrap!(pfunc_sample_bootstrap, SampleBootstrap);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_world() {
        let result = SampleBootstrap.invoke("helloWorld", &[json!("James")]).unwrap();
        assert_eq!(result, json!("Hello James"));
    }

    #[test]
    fn test_unknown_function() {
        let err = SampleBootstrap.invoke("goodbye", &[]).unwrap_err();
        assert_eq!(err, BootstrapError::UnknownFunction("goodbye".to_string()));
    }

    #[test]
    fn test_registered_in_static_registry() {
        let module = StaticModule::all()
            .find(|m| m.name == "pfunc-sample")
            .expect("sample module registered");
        assert_eq!(module.manifest, Some(MANIFEST));
        assert!(module.entry_point(ENTRY_POINT).is_some());
        assert!(module.entry_point("pfunc_bootstrap").is_none());
    }
}
