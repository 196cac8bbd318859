//! Function Registry
//!
//! Name-addressed map of every function discovered from bootstrap units.
//! A name, once bound, is never replaced or removed.

pub mod descriptor;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::common::{AppError, AppResult};
use crate::manifest;
use crate::router::{Arguments, BootstrapUnit, RegisteredFunction};
use crate::scope::Scope;

pub use descriptor::{FunctionDescriptor, ParameterDescriptor};

/// A name that lost against an existing registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub name: String,
    /// Origin of the unit that kept the name.
    pub kept_origin: String,
}

/// Outcome of registering one or more units
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub registered: Vec<String>,
    pub rejected: Vec<Rejected>,
}

impl Registration {
    pub fn merge(&mut self, other: Registration) {
        self.registered.extend(other.registered);
        self.rejected.extend(other.rejected);
    }
}

/// Registry of invocable functions
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, Arc<RegisteredFunction>>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every function `unit` offers.
    ///
    /// The metadata entry point is called once. Values without a name are
    /// dropped. A name that is already bound keeps its existing entry.
    pub fn register(&self, unit: Arc<BootstrapUnit>) -> AppResult<Registration> {
        let infos = unit.metadata().map_err(|e| {
            AppError::configuration(format!(
                "Metadata of {} from {} failed: {}",
                unit.type_name(),
                unit.origin(),
                e
            ))
        })?;

        let mut report = Registration::default();
        for info in infos {
            let Some(descriptor) = FunctionDescriptor::from_info(info) else {
                debug!("Dropped nameless function from {}", unit.origin());
                continue;
            };
            let name = descriptor.name().to_string();

            // Insert-if-absent under one write guard keeps the first winner.
            let mut functions = self.functions.write();
            match functions.entry(name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(RegisteredFunction::new(descriptor, Arc::clone(&unit))));
                    drop(functions);
                    debug!("Registered {} from {}", name, unit.origin());
                    report.registered.push(name);
                }
                Entry::Occupied(existing) => {
                    let kept = existing.get().unit();
                    let kept_origin = kept.origin().to_string();
                    let rediscovered = kept_origin == unit.origin() && kept.type_name() == unit.type_name();
                    drop(functions);
                    if rediscovered {
                        debug!("{} from {} is already registered", name, kept_origin);
                    } else {
                        warn!(
                            "Function {} from {} is not registered; {} already provides it",
                            name,
                            unit.origin(),
                            kept_origin
                        );
                    }
                    report.rejected.push(Rejected { name, kept_origin });
                }
            }
        }
        Ok(report)
    }

    /// Scan `scope` for bootstrap units and register each.
    pub fn load_functions(&self, scope: &Arc<Scope>) -> AppResult<Registration> {
        let mut report = Registration::default();
        for unit in manifest::scan(scope)? {
            report.merge(self.register(unit)?);
        }
        info!(
            "Registered {} functions ({} rejected), {} total",
            report.registered.len(),
            report.rejected.len(),
            self.len()
        );
        Ok(report)
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredFunction>> {
        self.functions.read().get(name).cloned()
    }

    pub fn lookup(&self, name: &str) -> AppResult<Arc<RegisteredFunction>> {
        self.get(name).ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    /// Every registration, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, Arc<RegisteredFunction>> {
        self.functions
            .read()
            .iter()
            .map(|(name, function)| (name.clone(), Arc::clone(function)))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.snapshot().into_keys().collect()
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }

    /// Descriptors of every registration, ordered by name.
    pub fn function_metadata(&self) -> Vec<FunctionDescriptor> {
        self.snapshot().values().map(|f| f.metadata().clone()).collect()
    }

    pub fn invoke(&self, name: &str, args: impl Into<Arguments>) -> AppResult<Value> {
        self.lookup(name)?.invoke(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorCode;
    use crate::manifest::{Manifest, DEFAULT_BOOTSTRAP_TYPE};
    use crate::scope::{ModuleSource, StaticSource};
    use pfunc_bootstrap::{Bootstrap, BootstrapError, FunctionInfo, ParameterInfo, TypeTag};
    use serde_json::json;

    /// Offers each of its names and answers with `origin:name`; other names are unknown
    struct Provider {
        origin: String,
        names: Vec<String>,
    }

    impl Provider {
        fn new(origin: &str, names: &[&str]) -> Self {
            Self {
                origin: origin.to_string(),
                names: names.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl Bootstrap for Provider {
        fn invoke(&self, name: &str, _args: &[Value]) -> Result<Value, BootstrapError> {
            if !self.names.iter().any(|n| n == name) {
                return Err(BootstrapError::UnknownFunction(name.to_string()));
            }
            Ok(json!(format!("{}:{}", self.origin, name)))
        }

        fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
            Ok(self
                .names
                .iter()
                .map(|n| FunctionInfo::new(n.as_str()).parameter(ParameterInfo::new("x", TypeTag::Any)))
                .collect())
        }
    }

    struct BrokenMetadata;

    impl Bootstrap for BrokenMetadata {
        fn invoke(&self, _name: &str, _args: &[Value]) -> Result<Value, BootstrapError> {
            Ok(Value::Null)
        }

        fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
            Err(BootstrapError::failed("no metadata"))
        }
    }

    fn unit(origin: &str, entry: Arc<dyn Bootstrap>) -> Arc<BootstrapUnit> {
        Arc::new(BootstrapUnit::new(
            Scope::empty(),
            origin.to_string(),
            DEFAULT_BOOTSTRAP_TYPE.to_string(),
            Manifest::default(),
            entry,
        ))
    }

    fn provider(origin: &str, names: &[&str]) -> Arc<BootstrapUnit> {
        unit(origin, Arc::new(Provider::new(origin, names)))
    }

    #[test]
    fn test_disjoint_units_sum() {
        let registry = FunctionRegistry::new();
        registry.register(provider("a", &["a1", "a2"])).unwrap();
        registry.register(provider("b", &["b1"])).unwrap();
        registry.register(provider("c", &["c1", "c2", "c3"])).unwrap();

        assert_eq!(registry.len(), 6);
        for name in ["a1", "a2", "b1", "c1", "c2", "c3"] {
            assert_eq!(registry.lookup(name).unwrap().name(), name);
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let registry = FunctionRegistry::new();
        registry.register(provider("first", &["f"])).unwrap();
        let report = registry.register(provider("second", &["f", "g"])).unwrap();

        assert_eq!(report.registered, vec!["g".to_string()]);
        assert_eq!(
            report.rejected,
            vec![Rejected {
                name: "f".to_string(),
                kept_origin: "first".to_string()
            }]
        );
        assert_eq!(registry.invoke("f", ()).unwrap(), json!("first:f"));
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let registry = FunctionRegistry::new();
        let units: Vec<Arc<BootstrapUnit>> = (0..8).map(|i| provider(&format!("u{}", i), &["shared"])).collect();

        let reports: Vec<Registration> = std::thread::scope(|s| {
            let handles: Vec<_> = units
                .iter()
                .map(|u| {
                    let registry = &registry;
                    let u = Arc::clone(u);
                    s.spawn(move || registry.register(u).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners: Vec<&Registration> = reports.iter().filter(|r| !r.registered.is_empty()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(reports.iter().map(|r| r.rejected.len()).sum::<usize>(), 7);

        let kept = registry.lookup("shared").unwrap();
        for report in &reports {
            for rejected in &report.rejected {
                assert_eq!(rejected.kept_origin, kept.unit().origin());
            }
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_lookup_unknown_is_not_found() {
        let registry = FunctionRegistry::new();
        let err = registry.lookup("missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(registry.invoke("missing", ()).unwrap_err().code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_nameless_values_are_dropped() {
        let registry = FunctionRegistry::new();
        let report = registry.register(provider("a", &["", "kept"])).unwrap();
        assert_eq!(report.registered, vec!["kept".to_string()]);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn test_registered_name_is_the_name_dispatched() {
        let registry = FunctionRegistry::new();
        let report = registry.register(provider("a", &[" greet"])).unwrap();

        assert_eq!(report.registered, vec![" greet".to_string()]);
        assert!(registry.get("greet").is_none());
        assert_eq!(registry.invoke(" greet", ()).unwrap(), json!("a: greet"));
    }

    #[test]
    fn test_failing_metadata_is_configuration_error() {
        let registry = FunctionRegistry::new();
        let err = registry.register(unit("broken", Arc::new(BrokenMetadata))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_snapshot_is_ordered() {
        let registry = FunctionRegistry::new();
        registry.register(provider("a", &["zeta", "alpha", "mid"])).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
        let metadata = registry.function_metadata();
        assert_eq!(metadata[0].prototype(), "alpha(any x) -> any");
    }

    #[test]
    fn test_load_functions_scans_scope() {
        let source = StaticSource::new("local")
            .with_manifest("")
            .with_entry_point(DEFAULT_BOOTSTRAP_TYPE, Arc::new(Provider::new("local", &["one", "two"])));
        let scope = Scope::from_sources(None, vec![Arc::new(source) as Arc<dyn ModuleSource>]);

        let registry = FunctionRegistry::new();
        let report = registry.load_functions(&scope).unwrap();
        assert_eq!(report.registered.len(), 2);

        // Loading the same scope again rediscovers the same unit.
        let again = registry.load_functions(&scope).unwrap();
        assert!(again.registered.is_empty());
        assert_eq!(again.rejected.len(), 2);
        assert_eq!(registry.len(), 2);
    }
}
