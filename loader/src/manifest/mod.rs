//! Manifest System
//!
//! Manifest resources name the bootstrap type of each module; the scanner
//! binds them to bootstrap units.

pub mod loader;
pub mod types;

pub use loader::scan;
pub use types::{Manifest, BOOTSTRAP_KEY, DEFAULT_BOOTSTRAP_TYPE, MANIFEST_NAME};
