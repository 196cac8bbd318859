//! Compiled-in Module Registry
//!
//! Modules linked directly into the host register themselves here with
//! [`inventory::submit!`]; the host's built-in scope enumerates them.

use std::sync::Arc;

use crate::contract::Bootstrap;

/// Constructor for one bootstrap type
pub type BootstrapFactory = fn() -> Arc<dyn Bootstrap>;

/// A module compiled into the current binary
pub struct StaticModule {
    /// Identifies the module in logs and registration reports.
    pub name: &'static str,
    /// Manifest resource text, `None` when the module ships without one.
    pub manifest: Option<&'static str>,
    /// Bootstrap types defined by the module, by type name.
    pub entry_points: &'static [(&'static str, BootstrapFactory)],
}

impl StaticModule {
    pub fn entry_point(&self, type_name: &str) -> Option<Arc<dyn Bootstrap>> {
        self.entry_points
            .iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, factory)| factory())
    }

    /// Every module registered in this binary.
    pub fn all() -> impl Iterator<Item = &'static StaticModule> {
        inventory::iter::<StaticModule>()
    }
}

inventory::collect!(StaticModule);
