//! Manifest Scanner
//!
//! Finds every manifest resource visible in a scope and binds each one to a
//! bootstrap unit.

use std::sync::Arc;

use tracing::{debug, info};

use super::types::{Manifest, MANIFEST_NAME};
use crate::common::AppResult;
use crate::router::BootstrapUnit;
use crate::scope::Scope;

/// Bind one bootstrap unit per manifest resource in `scope`.
///
/// A scope without manifests yields no units. The bootstrap type is looked up
/// in the source that supplied the manifest first, then through the scope, so
/// modules sharing the default type name each bind their own implementation.
pub fn scan(scope: &Arc<Scope>) -> AppResult<Vec<Arc<BootstrapUnit>>> {
    let resources = scope.resources(MANIFEST_NAME)?;
    let mut units = Vec::with_capacity(resources.len());

    for resource in resources {
        let manifest = Manifest::parse(&resource.text);
        let type_name = manifest.bootstrap_type().to_string();
        let origin = resource.source.origin().to_string();

        let entry = match resource.source.entry_point(&type_name)? {
            Some(entry) => entry,
            None => scope.resolve_type(&type_name)?,
        };

        debug!("Bound bootstrap type {} from {}", type_name, origin);
        units.push(Arc::new(BootstrapUnit::new(
            Arc::clone(scope),
            origin,
            type_name,
            manifest,
            entry,
        )));
    }

    info!("Found {} bootstrap units", units.len());
    Ok(units)
}
