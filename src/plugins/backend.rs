//! Dynamic module backend: open a library, resolve the factory symbol, close it.
//!
//! The native implementation is selected at build time. Everything above
//! this module talks to the [`ModuleBackend`] trait only.

use std::path::Path;
use thiserror::Error;

use super::abi::PluginEntryPoint;

/// Native shared library extension for the host platform.
#[cfg(windows)]
pub const NATIVE_LIBRARY_EXTENSION: &str = "dll";
#[cfg(target_os = "macos")]
pub const NATIVE_LIBRARY_EXTENSION: &str = "dylib";
#[cfg(all(unix, not(target_os = "macos")))]
pub const NATIVE_LIBRARY_EXTENSION: &str = "so";

/// Errors reported by the module backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The loader refused to map the file.
    #[error("{0}")]
    Open(String),

    /// The symbol is not exported by the module.
    #[error("symbol `{symbol}` not found: {reason}")]
    Resolve { symbol: String, reason: String },
}

/// Platform loader primitives.
///
/// Failure of `open` and `resolve` is an expected outcome. `close` must be
/// called at most once per handle returned from `open`; taking the handle by
/// value enforces that.
pub trait ModuleBackend {
    type Handle;

    fn open(&self, path: &Path) -> Result<Self::Handle, BackendError>;

    fn resolve(
        &self,
        handle: &Self::Handle,
        symbol: &[u8],
    ) -> Result<PluginEntryPoint, BackendError>;

    fn close(&self, handle: Self::Handle);
}

/// Opaque handle to a library opened by [`NativeBackend`].
pub struct ModuleHandle(imp::Library);

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ModuleHandle").finish()
    }
}

/// The operating system's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeBackend;

impl ModuleBackend for NativeBackend {
    type Handle = ModuleHandle;

    fn open(&self, path: &Path) -> Result<ModuleHandle, BackendError> {
        imp::open(path).map(ModuleHandle)
    }

    fn resolve(
        &self,
        handle: &ModuleHandle,
        symbol: &[u8],
    ) -> Result<PluginEntryPoint, BackendError> {
        // SAFETY: Every symbol the host asks for is declared with the
        // `PluginEntryPoint` signature by the plugin ABI.
        let entry = unsafe { handle.0.get::<PluginEntryPoint>(symbol) }.map_err(|e| {
            BackendError::Resolve {
                symbol: symbol_display(symbol),
                reason: e.to_string(),
            }
        })?;
        Ok(*entry)
    }

    fn close(&self, handle: ModuleHandle) {
        if let Err(e) = handle.0.close() {
            tracing::warn!("Failed to close plugin module: {}", e);
        }
    }
}

fn symbol_display(symbol: &[u8]) -> String {
    let trimmed = symbol.strip_suffix(b"\0").unwrap_or(symbol);
    String::from_utf8_lossy(trimmed).into_owned()
}

#[cfg(unix)]
mod imp {
    use super::BackendError;
    use std::path::Path;

    pub use libloading::os::unix::Library;
    use libloading::os::unix::RTLD_LAZY;

    pub fn open(path: &Path) -> Result<Library, BackendError> {
        // SAFETY: Opening a module runs its initialisers. Plugins run
        // in-process and are trusted by the host.
        unsafe { Library::open(Some(path), RTLD_LAZY) }
            .map_err(|e| BackendError::Open(e.to_string()))
    }
}

#[cfg(windows)]
mod imp {
    use super::BackendError;
    use std::path::Path;

    pub use libloading::os::windows::Library;

    pub fn open(path: &Path) -> Result<Library, BackendError> {
        // SAFETY: Opening a module runs DllMain. Plugins run in-process and
        // are trusted by the host.
        unsafe { Library::new(path) }.map_err(|e| BackendError::Open(e.to_string()))
    }
}

/// Whether `path` carries the native library extension of this platform.
pub fn has_library_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == NATIVE_LIBRARY_EXTENSION)
}
