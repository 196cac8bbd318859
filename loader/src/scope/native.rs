//! Native Modules
//!
//! Shared libraries opened with `libloading`. A library file is one module;
//! a directory is a module whose manifest is a file at its root and whose
//! entry points live in the shared libraries directly inside it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use once_cell::sync::OnceCell;
use pfunc_bootstrap::abi::{
    entry_symbol, PfuncEntryPoint, PfuncEntryV1, PfuncFreeFn, PfuncInvokeFn, PfuncManifestFn,
    PfuncMetadataFn, PfuncOwnedStr, PfuncStatus, PfuncStr, MANIFEST_SYMBOL, PFUNC_ABI_VERSION,
};
use pfunc_bootstrap::{Bootstrap, BootstrapError, FunctionInfo, Value};
use tracing::{debug, warn};
use url::Url;

use super::{Linker, ModuleSource};
use crate::common::{AppError, AppResult};
use crate::manifest::MANIFEST_NAME;

/// Opens `file:` locations as native modules
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeLinker;

impl Linker for NativeLinker {
    fn open(&self, location: &Url) -> AppResult<Arc<dyn ModuleSource>> {
        if location.scheme() != "file" {
            return Err(AppError::configuration(format!(
                "Unsupported module location scheme '{}': {}",
                location.scheme(),
                location
            )));
        }
        let path = location
            .to_file_path()
            .map_err(|_| AppError::configuration(format!("Invalid file location: {}", location)))?;

        if path.is_dir() {
            Ok(Arc::new(DirectoryModule::new(path)))
        } else {
            Ok(Arc::new(NativeModule::open(&path)?))
        }
    }
}

/// One shared library
pub struct NativeModule {
    origin: String,
    library: Arc<Library>,
}

impl NativeModule {
    pub fn open(path: &Path) -> AppResult<Self> {
        // SAFETY: loading runs the library's initialisers; module libraries are
        // trusted code supplied by the operator.
        let library = unsafe { Library::new(path) }.map_err(|e| {
            AppError::configuration(format!("Failed to load library {}: {}", path.display(), e))
        })?;
        debug!("Loaded native module {}", path.display());
        Ok(Self {
            origin: path.display().to_string(),
            library: Arc::new(library),
        })
    }

    fn manifest(&self) -> AppResult<Option<String>> {
        // SAFETY: `pfunc_manifest` is declared by the ABI with this signature.
        let symbol: Symbol<PfuncManifestFn> = match unsafe { self.library.get(MANIFEST_SYMBOL.as_bytes()) } {
            Ok(symbol) => symbol,
            Err(_) => return Ok(None),
        };
        // SAFETY: the manifest text is static data of the still-loaded library.
        let text = unsafe { symbol().as_str() }.map_err(|e| {
            AppError::configuration(format!("Failed to load manifest of {}: {}", self.origin, e))
        })?;
        Ok(Some(text.to_string()))
    }
}

impl ModuleSource for NativeModule {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn resource(&self, name: &str) -> AppResult<Option<String>> {
        if name == MANIFEST_NAME {
            self.manifest()
        } else {
            Ok(None)
        }
    }

    fn entry_point(&self, type_name: &str) -> AppResult<Option<Arc<dyn Bootstrap>>> {
        // Only prefixed symbols are bootstrap types; anything else the loader
        // can see, including the library's own dependencies, is not.
        let symbol_name = entry_symbol(type_name);
        // SAFETY: prefixed symbols are generated by `export_bootstrap!` with the
        // `PfuncEntryPoint` signature.
        let symbol: Symbol<PfuncEntryPoint> = match unsafe { self.library.get(symbol_name.as_bytes()) } {
            Ok(symbol) => symbol,
            Err(_) => return Ok(None),
        };
        let entry = *symbol;
        let bootstrap: Arc<dyn Bootstrap> =
            Arc::new(NativeBootstrap::bind(Arc::clone(&self.library), &self.origin, type_name, entry)?);
        Ok(Some(bootstrap))
    }
}

/// A directory holding a manifest file and shared libraries
pub struct DirectoryModule {
    root: PathBuf,
    origin: String,
    libraries: OnceCell<Vec<NativeModule>>,
}

impl DirectoryModule {
    pub fn new(root: PathBuf) -> Self {
        Self {
            origin: root.display().to_string(),
            root,
            libraries: OnceCell::new(),
        }
    }

    fn libraries(&self) -> &[NativeModule] {
        self.libraries.get_or_init(|| {
            let entries = match fs::read_dir(&self.root) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to read module directory {:?}: {}", self.root, e);
                    return Vec::new();
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_file()
                        && path.extension().and_then(|s| s.to_str()) == Some(std::env::consts::DLL_EXTENSION)
                })
                .collect();
            paths.sort();

            paths
                .iter()
                .filter_map(|path| match NativeModule::open(path) {
                    Ok(module) => Some(module),
                    Err(e) => {
                        warn!("Skipping library in {:?}: {}", self.root, e);
                        None
                    }
                })
                .collect()
        })
    }
}

impl ModuleSource for DirectoryModule {
    fn origin(&self) -> &str {
        &self.origin
    }

    fn resource(&self, name: &str) -> AppResult<Option<String>> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AppError::configuration(format!("Failed to load {}: {}", path.display(), e)))
    }

    fn entry_point(&self, type_name: &str) -> AppResult<Option<Arc<dyn Bootstrap>>> {
        for library in self.libraries() {
            if let Some(entry) = library.entry_point(type_name)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

/// A bootstrap bound through the native ABI
pub struct NativeBootstrap {
    origin: String,
    invoke: PfuncInvokeFn,
    metadata: PfuncMetadataFn,
    free_str: PfuncFreeFn,
    // Keeps the function pointers above valid.
    _library: Arc<Library>,
}

impl NativeBootstrap {
    /// Call `entry` and verify the vtable it fills in.
    pub fn bind(
        library: Arc<Library>,
        origin: &str,
        type_name: &str,
        entry: PfuncEntryPoint,
    ) -> AppResult<Self> {
        // The guest fills in the size; an entry point that writes nothing fails the check.
        let mut vtable = PfuncEntryV1 {
            struct_size: 0,
            ..PfuncEntryV1::empty()
        };
        // SAFETY: `vtable` is a valid, writable slot for the duration of the call.
        let status = unsafe { entry(&mut vtable) };
        if status != PfuncStatus::Ok {
            return Err(AppError::configuration(format!(
                "Bootstrap type {} in {} failed to initialise: {:?}",
                type_name, origin, status
            )));
        }
        if vtable.struct_size < std::mem::size_of::<PfuncEntryV1>() {
            return Err(AppError::configuration(format!(
                "Bootstrap type {} in {} filled a {} byte entry table (expected {})",
                type_name,
                origin,
                vtable.struct_size,
                std::mem::size_of::<PfuncEntryV1>()
            )));
        }
        if vtable.abi_version != PFUNC_ABI_VERSION {
            return Err(AppError::configuration(format!(
                "Bootstrap type {} in {} has ABI version {} (expected {})",
                type_name, origin, vtable.abi_version, PFUNC_ABI_VERSION
            )));
        }

        let missing = |method: &str| {
            AppError::configuration(format!(
                "Bootstrap type {} does not have a method {} in {}",
                type_name, method, origin
            ))
        };
        let invoke = vtable.invoke.ok_or_else(|| missing("invoke(string, sequence<any>)"))?;
        let metadata = vtable.metadata.ok_or_else(|| missing("functionMetadata()"))?;
        let free_str = vtable.free_str.ok_or_else(|| missing("free_str(string)"))?;

        Ok(Self {
            origin: origin.to_string(),
            invoke,
            metadata,
            free_str,
            _library: library,
        })
    }

    fn take(&self, out: PfuncOwnedStr) -> String {
        // SAFETY: `out` was filled by this library and is released exactly once.
        unsafe {
            let text = out.to_string_lossy();
            (self.free_str)(out);
            text
        }
    }
}

impl Bootstrap for NativeBootstrap {
    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, BootstrapError> {
        let payload = serde_json::to_string(args)
            .map_err(|e| BootstrapError::Abi(format!("could not encode arguments: {}", e)))?;

        let mut out = PfuncOwnedStr::empty();
        // SAFETY: both strings outlive the call and `out` is a valid slot.
        let status = unsafe { (self.invoke)(PfuncStr::new(name), PfuncStr::new(&payload), &mut out) };
        let text = self.take(out);

        match status {
            PfuncStatus::Ok => serde_json::from_str(&text)
                .map_err(|e| BootstrapError::Abi(format!("invalid result from {}: {}", self.origin, e))),
            _ => Err(BootstrapError::Failed(text)),
        }
    }

    fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
        let mut out = PfuncOwnedStr::empty();
        // SAFETY: `out` is a valid slot.
        let status = unsafe { (self.metadata)(&mut out) };
        let text = self.take(out);
        if status != PfuncStatus::Ok {
            return Err(BootstrapError::Failed(text));
        }

        let values: Vec<Value> = serde_json::from_str(&text)
            .map_err(|e| BootstrapError::Abi(format!("invalid metadata from {}: {}", self.origin, e)))?;
        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<FunctionInfo>(value) {
                Ok(info) => Some(info),
                Err(e) => {
                    debug!("Dropping unreadable metadata value from {}: {}", self.origin, e);
                    None
                }
            })
            .collect())
    }
}
