//! Native C ABI
//!
//! Shared-library modules expose their bootstrap through a small vtable.
//! Names, arguments, results and metadata cross the boundary as UTF-8 JSON
//! text; strings produced by the guest are released with the guest's own
//! `free_str`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;

use crate::contract::{Bootstrap, BootstrapError};

pub const PFUNC_ABI_VERSION: u32 = 1;

/// Symbol a native library exports to carry its manifest resource.
pub const MANIFEST_SYMBOL: &str = "pfunc_manifest";

/// Prefix of every exported bootstrap type symbol.
pub const ENTRY_SYMBOL_PREFIX: &str = "pfunc_entry_";

/// Exported symbol name of the bootstrap type `type_name`.
pub fn entry_symbol(type_name: &str) -> String {
    format!("{}{}", ENTRY_SYMBOL_PREFIX, type_name)
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PfuncStatus {
    Ok = 0,
    Failed = 1,
    Incompatible = 2,
}

/// Borrowed UTF-8 string
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PfuncStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl PfuncStr {
    pub const fn from_static(s: &'static str) -> Self {
        Self {
            ptr: s.as_ptr(),
            len: s.len(),
        }
    }

    pub fn new(s: &str) -> Self {
        Self {
            ptr: s.as_ptr(),
            len: s.len(),
        }
    }

    /// # Safety
    /// `ptr` must be null or point to `len` readable bytes that outlive `'a`.
    pub unsafe fn as_str<'a>(&self) -> Result<&'a str, BootstrapError> {
        if self.ptr.is_null() {
            return Ok("");
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).map_err(|e| BootstrapError::Abi(format!("invalid utf-8: {}", e)))
    }
}

/// String allocated by one side and released by the same side's `free_str`
#[repr(C)]
#[derive(Debug)]
pub struct PfuncOwnedStr {
    pub ptr: *mut u8,
    pub len: usize,
}

impl PfuncOwnedStr {
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    pub fn from_string(s: String) -> Self {
        let bytes = s.into_bytes().into_boxed_slice();
        let len = bytes.len();
        let ptr = Box::into_raw(bytes) as *mut u8;
        Self { ptr, len }
    }

    /// Copy the contents out without releasing them.
    ///
    /// # Safety
    /// `ptr` must be null or point to `len` readable bytes.
    pub unsafe fn to_string_lossy(&self) -> String {
        if self.ptr.is_null() {
            return String::new();
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        String::from_utf8_lossy(bytes).into_owned()
    }
}

pub type PfuncInvokeFn =
    unsafe extern "C" fn(name: PfuncStr, args: PfuncStr, out: *mut PfuncOwnedStr) -> PfuncStatus;
pub type PfuncMetadataFn = unsafe extern "C" fn(out: *mut PfuncOwnedStr) -> PfuncStatus;
pub type PfuncFreeFn = unsafe extern "C" fn(s: PfuncOwnedStr);

/// Bound entry points of one bootstrap type
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PfuncEntryV1 {
    pub struct_size: usize,
    pub abi_version: u32,
    pub invoke: Option<PfuncInvokeFn>,
    pub metadata: Option<PfuncMetadataFn>,
    pub free_str: Option<PfuncFreeFn>,
}

impl PfuncEntryV1 {
    pub const fn empty() -> Self {
        Self {
            struct_size: std::mem::size_of::<PfuncEntryV1>(),
            abi_version: 0,
            invoke: None,
            metadata: None,
            free_str: None,
        }
    }
}

/// Signature of an exported bootstrap type symbol.
pub type PfuncEntryPoint = unsafe extern "C" fn(out: *mut PfuncEntryV1) -> PfuncStatus;

/// Signature of the exported manifest symbol.
pub type PfuncManifestFn = unsafe extern "C" fn() -> PfuncStr;

/// Guest side of `invoke`: decode, dispatch, encode.
///
/// # Safety
/// `name` and `args` must satisfy [`PfuncStr::as_str`]; `out` must be null or
/// valid for a write.
pub unsafe fn guest_invoke<B: Bootstrap + ?Sized>(
    bootstrap: &B,
    name: PfuncStr,
    args: PfuncStr,
    out: *mut PfuncOwnedStr,
) -> PfuncStatus {
    if out.is_null() {
        return PfuncStatus::Failed;
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| -> Result<Value, BootstrapError> {
        let name = unsafe { name.as_str() }?;
        let args = unsafe { args.as_str() }?;
        let args: Vec<Value> = if args.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(args)
                .map_err(|e| BootstrapError::Abi(format!("invalid arguments: {}", e)))?
        };
        bootstrap.invoke(name, &args)
    }));

    let (status, text) = match outcome {
        Ok(Ok(value)) => (PfuncStatus::Ok, value.to_string()),
        Ok(Err(e)) => (PfuncStatus::Failed, e.to_string()),
        Err(panic) => (PfuncStatus::Failed, panic_message(panic.as_ref())),
    };
    unsafe { out.write(PfuncOwnedStr::from_string(text)) };
    status
}

/// Guest side of `metadata`.
///
/// # Safety
/// `out` must be null or valid for a write.
pub unsafe fn guest_metadata<B: Bootstrap + ?Sized>(bootstrap: &B, out: *mut PfuncOwnedStr) -> PfuncStatus {
    if out.is_null() {
        return PfuncStatus::Failed;
    }

    let outcome = catch_unwind(AssertUnwindSafe(|| bootstrap.function_metadata()));
    let (status, text) = match outcome {
        Ok(Ok(infos)) => match serde_json::to_string(&infos) {
            Ok(json) => (PfuncStatus::Ok, json),
            Err(e) => (PfuncStatus::Failed, format!("could not encode metadata: {}", e)),
        },
        Ok(Err(e)) => (PfuncStatus::Failed, e.to_string()),
        Err(panic) => (PfuncStatus::Failed, panic_message(panic.as_ref())),
    };
    unsafe { out.write(PfuncOwnedStr::from_string(text)) };
    status
}

/// Guest side of `free_str`.
///
/// # Safety
/// `s` must have been produced by [`PfuncOwnedStr::from_string`] in this
/// library and not freed before.
pub unsafe extern "C" fn guest_free_str(s: PfuncOwnedStr) {
    if s.ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(s.ptr, s.len);
    drop(unsafe { Box::from_raw(slice) });
}

pub fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("function panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("function panicked: {}", s)
    } else {
        "function panicked".to_string()
    }
}

/// Export a bootstrap type from a shared library as type name `symbol`.
///
/// The exported symbol is `symbol` behind [`ENTRY_SYMBOL_PREFIX`]. The type
/// must implement [`Bootstrap`] and `Default`; one instance is created on
/// first use and lives for the lifetime of the library.
///
/// The manifest and bootstrap exports of a module crate belong behind a
/// feature enabled only for its shared-library build, so several modules can
/// be linked into one host.
#[macro_export]
macro_rules! export_bootstrap {
    ($symbol:ident, $ty:ty) => {
        #[export_name = concat!("pfunc_entry_", stringify!($symbol))]
        /// # Safety
        /// `out` must be null or valid for a write of a `PfuncEntryV1`.
        pub unsafe extern "C" fn $symbol(
            out: *mut $crate::abi::PfuncEntryV1,
        ) -> $crate::abi::PfuncStatus {
            static INSTANCE: ::std::sync::OnceLock<$ty> = ::std::sync::OnceLock::new();

            fn instance() -> &'static $ty {
                INSTANCE.get_or_init(<$ty as ::std::default::Default>::default)
            }

            unsafe extern "C" fn invoke(
                name: $crate::abi::PfuncStr,
                args: $crate::abi::PfuncStr,
                out: *mut $crate::abi::PfuncOwnedStr,
            ) -> $crate::abi::PfuncStatus {
                unsafe { $crate::abi::guest_invoke(instance(), name, args, out) }
            }

            unsafe extern "C" fn metadata(
                out: *mut $crate::abi::PfuncOwnedStr,
            ) -> $crate::abi::PfuncStatus {
                unsafe { $crate::abi::guest_metadata(instance(), out) }
            }

            if out.is_null() {
                return $crate::abi::PfuncStatus::Failed;
            }
            unsafe {
                out.write($crate::abi::PfuncEntryV1 {
                    struct_size: ::std::mem::size_of::<$crate::abi::PfuncEntryV1>(),
                    abi_version: $crate::abi::PFUNC_ABI_VERSION,
                    invoke: Some(invoke),
                    metadata: Some(metadata),
                    free_str: Some($crate::abi::guest_free_str),
                });
            }
            $crate::abi::PfuncStatus::Ok
        }
    };
}

/// Export the manifest resource of a shared library.
#[macro_export]
macro_rules! export_manifest {
    ($text:expr) => {
        #[no_mangle]
        pub extern "C" fn pfunc_manifest() -> $crate::abi::PfuncStr {
            $crate::abi::PfuncStr::from_static($text)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::FunctionInfo;
    use serde_json::json;

    #[derive(Default)]
    struct Echo;

    impl Bootstrap for Echo {
        fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, BootstrapError> {
            match name {
                "echo" => Ok(Value::Array(args.to_vec())),
                "boom" => panic!("boom"),
                _ => Err(BootstrapError::UnknownFunction(name.to_string())),
            }
        }

        fn function_metadata(&self) -> Result<Vec<FunctionInfo>, BootstrapError> {
            Ok(vec![FunctionInfo::new("echo")])
        }
    }

    export_bootstrap!(pfunc_test_echo, Echo);

    fn call(entry: &PfuncEntryV1, name: &str, args: &str) -> (PfuncStatus, String) {
        let mut out = PfuncOwnedStr::empty();
        let invoke = entry.invoke.unwrap();
        let status = unsafe { invoke(PfuncStr::new(name), PfuncStr::new(args), &mut out) };
        let text = unsafe { out.to_string_lossy() };
        unsafe { (entry.free_str.unwrap())(out) };
        (status, text)
    }

    #[test]
    fn test_entry_symbol() {
        assert_eq!(entry_symbol("pfunc_test_echo"), "pfunc_entry_pfunc_test_echo");
    }

    fn bind() -> PfuncEntryV1 {
        let mut entry = PfuncEntryV1::empty();
        let status = unsafe { pfunc_test_echo(&mut entry) };
        assert_eq!(status, PfuncStatus::Ok);
        assert_eq!(entry.abi_version, PFUNC_ABI_VERSION);
        entry
    }

    #[test]
    fn test_exported_invoke() {
        let entry = bind();
        let (status, text) = call(&entry, "echo", r#"["a",1]"#);
        assert_eq!(status, PfuncStatus::Ok);
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), json!(["a", 1]));
    }

    #[test]
    fn test_exported_invoke_failures() {
        let entry = bind();
        let (status, text) = call(&entry, "missing", "[]");
        assert_eq!(status, PfuncStatus::Failed);
        assert_eq!(text, "Function does not exist: missing");

        let (status, text) = call(&entry, "boom", "[]");
        assert_eq!(status, PfuncStatus::Failed);
        assert_eq!(text, "function panicked: boom");
    }

    #[test]
    fn test_exported_metadata() {
        let entry = bind();
        let mut out = PfuncOwnedStr::empty();
        let status = unsafe { (entry.metadata.unwrap())(&mut out) };
        let text = unsafe { out.to_string_lossy() };
        unsafe { (entry.free_str.unwrap())(out) };
        assert_eq!(status, PfuncStatus::Ok);
        let infos: Vec<FunctionInfo> = serde_json::from_str(&text).unwrap();
        assert_eq!(infos[0].name, "echo");
    }
}
