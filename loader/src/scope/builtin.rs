//! In-memory Module Sources
//!
//! Backs the built-in scope (modules compiled into the binary) and any scope
//! assembled directly from sources.

use std::collections::HashMap;
use std::sync::Arc;

use pfunc_bootstrap::{Bootstrap, StaticModule};

use super::ModuleSource;
use crate::common::AppResult;
use crate::manifest::MANIFEST_NAME;

pub struct StaticSource {
    origin: String,
    resources: HashMap<String, String>,
    entry_points: HashMap<String, Arc<dyn Bootstrap>>,
}

impl StaticSource {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            resources: HashMap::new(),
            entry_points: HashMap::new(),
        }
    }

    pub fn from_module(module: &'static StaticModule) -> Self {
        let mut source = Self::new(format!("builtin:{}", module.name));
        if let Some(manifest) = module.manifest {
            source = source.with_manifest(manifest);
        }
        for (type_name, factory) in module.entry_points {
            source = source.with_entry_point(*type_name, factory());
        }
        source
    }

    pub fn with_resource(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.resources.insert(name.into(), text.into());
        self
    }

    pub fn with_manifest(self, text: impl Into<String>) -> Self {
        self.with_resource(MANIFEST_NAME, text)
    }

    pub fn with_entry_point(mut self, type_name: impl Into<String>, entry: Arc<dyn Bootstrap>) -> Self {
        self.entry_points.insert(type_name.into(), entry);
        self
    }
}

impl ModuleSource for StaticSource {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn resource(&self, name: &str) -> AppResult<Option<String>> {
        Ok(self.resources.get(name).cloned())
    }

    fn entry_point(&self, type_name: &str) -> AppResult<Option<Arc<dyn Bootstrap>>> {
        Ok(self.entry_points.get(type_name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FunctionRegistry;
    use crate::scope::Scope;
    use pfunc_bootstrap::{BootstrapError, FunctionInfo, Value};
    use serde_json::json;

    /// A second module linked into the test binary next to the sample
    struct Farewell;

    impl Bootstrap for Farewell {
        fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, BootstrapError> {
            match name {
                "goodbyeWorld" => Ok(json!(format!("Goodbye {}", pfunc_bootstrap::required_argument::<String>(args, 0)?))),
                _ => Err(BootstrapError::UnknownFunction(name.to_string())),
            }
        }

        fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
            Ok(vec![FunctionInfo::new("goodbyeWorld")])
        }
    }

    fn farewell() -> Arc<dyn Bootstrap> {
        Arc::new(Farewell)
    }

    inventory::submit! {
        StaticModule {
            name: "pfunc-farewell",
            manifest: Some("bootstrap = pfunc_farewell_bootstrap\n"),
            entry_points: &[("pfunc_farewell_bootstrap", farewell)],
        }
    }

    #[test]
    fn test_builtin_scope_exposes_compiled_in_modules() {
        let scope = Scope::builtin();
        let resources = scope.resources(MANIFEST_NAME).unwrap();
        let sample = resources
            .iter()
            .find(|r| r.source.origin() == "builtin:pfunc-sample")
            .expect("sample manifest visible");
        assert_eq!(sample.text, pfunc_sample::MANIFEST);

        let entry = scope.resolve_type(pfunc_sample::ENTRY_POINT).unwrap();
        assert_eq!(entry.invoke("helloWorld", &[json!("James")]).unwrap(), json!("Hello James"));
    }

    #[test]
    fn test_several_compiled_in_modules_register_together() {
        let registry = FunctionRegistry::new();
        registry.load_functions(&Scope::builtin()).unwrap();

        assert_eq!(registry.invoke("helloWorld", "James").unwrap(), json!("Hello James"));
        assert_eq!(registry.invoke("goodbyeWorld", "James").unwrap(), json!("Goodbye James"));
        assert_eq!(registry.lookup("goodbyeWorld").unwrap().unit().origin(), "builtin:pfunc-farewell");
    }
}
