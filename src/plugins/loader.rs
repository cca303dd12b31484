use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::abi::{validate_descriptor, DescriptorDefect, PluginInfo, ENTRY_POINT_SYMBOL};
use super::backend::{has_library_extension, BackendError, ModuleBackend, ModuleHandle, NativeBackend};

/// Why a single candidate module was rejected.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The loader could not open the file.
    #[error(transparent)]
    Open(BackendError),

    /// The module does not export the factory function.
    #[error("invalid plugin api")]
    MissingEntryPoint(#[source] BackendError),

    /// The factory returned a malformed descriptor.
    #[error("invalid plugin api")]
    InvalidDescriptor(#[source] DescriptorDefect),
}

/// A plugin module that passed validation.
///
/// Owns the module handle. The descriptor points into module memory and is
/// only valid while the handle is open; both are released together.
pub struct LoadedPlugin<H = ModuleHandle> {
    path: PathBuf,
    name: String,
    descriptor: Option<NonNull<PluginInfo>>,
    handle: Option<H>,
}

impl<H> LoadedPlugin<H> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name copied from the descriptor at load time.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.descriptor.is_some()
    }

    /// Invoke the plugin's render callback once. No-op after release.
    pub fn render(&self) {
        if let Some(descriptor) = self.descriptor {
            // SAFETY: The descriptor was validated at load time and the
            // module stays open until `release` clears this pointer.
            let info = unsafe { descriptor.as_ref() };
            if let Some(on_frame) = info.on_frame {
                on_frame();
            }
        }
    }

    /// Clear the descriptor and hand back the handle for closing.
    pub(crate) fn release(&mut self) -> Option<H> {
        self.descriptor = None;
        self.handle.take()
    }
}

impl<H> std::fmt::Debug for LoadedPlugin<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Outcome of one discovery pass.
///
/// `plugins` keeps discovery order for the lifetime of the host; UI state is
/// indexed positionally against it.
pub struct LoadResult<H = ModuleHandle> {
    pub plugins: Vec<LoadedPlugin<H>>,
    pub errors: Vec<String>,
}

impl<H> Default for LoadResult<H> {
    fn default() -> Self {
        Self {
            plugins: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<H> std::fmt::Debug for LoadResult<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadResult")
            .field("plugins", &self.plugins)
            .field("errors", &self.errors)
            .finish()
    }
}

/// Discovery options.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Sort candidates by path instead of keeping filesystem order.
    pub sort_by_path: bool,
}

/// Load from `configured`, or from the directory `locate_default` finds.
///
/// If no directory is configured and the default cannot be located, the
/// failure becomes the single load error and no plugins are loaded.
pub fn resolve_and_load<B, F>(
    backend: &B,
    configured: Option<PathBuf>,
    locate_default: F,
    options: LoadOptions,
) -> LoadResult<B::Handle>
where
    B: ModuleBackend,
    F: FnOnce() -> Result<PathBuf>,
{
    let directory = match configured {
        Some(dir) => dir,
        None => match locate_default() {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Cannot locate plugin directory: {:#}", e);
                let mut result = LoadResult::default();
                result.errors.push(format!("plugin directory: {:#}", e));
                return result;
            }
        },
    };
    load_plugins_with(backend, &directory, options)
}

/// Load every plugin module found directly inside `directory`.
pub fn load_plugins(directory: &Path) -> LoadResult {
    load_plugins_with(&NativeBackend, directory, LoadOptions::default())
}

/// Load plugins through an explicit backend.
///
/// Never fails as a whole: every candidate with the native library
/// extension ends up either in `plugins` or as one entry in `errors`.
pub fn load_plugins_with<B: ModuleBackend>(
    backend: &B,
    directory: &Path,
    options: LoadOptions,
) -> LoadResult<B::Handle> {
    let mut result = LoadResult::default();

    if !directory.exists() {
        warn!("Plugin directory not found: {}", directory.display());
        result
            .errors
            .push(format!("{}: plugin directory not found", directory.display()));
        return result;
    }

    let mut candidates = match discover_candidates(directory, &mut result.errors) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("Failed to read plugin directory {}: {}", directory.display(), e);
            result.errors.push(format!("{}: {}", directory.display(), e));
            return result;
        }
    };

    if options.sort_by_path {
        candidates.sort();
    }

    debug!(
        "Found {} plugin candidates in {}",
        candidates.len(),
        directory.display()
    );

    for path in candidates {
        match load_one(backend, &path) {
            Ok(plugin) => {
                info!("Loaded plugin '{}' from {}", plugin.name(), path.display());
                result.plugins.push(plugin);
            }
            Err(e) => {
                let message = format!("{}: {}", path.display(), e);
                warn!(
                    "Failed to load plugin {}: {:#}",
                    path.display(),
                    anyhow::Error::new(e)
                );
                result.errors.push(message);
            }
        }
    }

    result
}

/// Regular files directly inside `directory` carrying the native extension.
///
/// Entries that cannot be read are recorded in `errors` and skipped.
fn discover_candidates(directory: &Path, errors: &mut Vec<String>) -> io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)?.map(|entry| entry.map(|e| e.path()));
    Ok(filter_candidates(directory, entries, errors))
}

fn filter_candidates<I>(directory: &Path, entries: I, errors: &mut Vec<String>) -> Vec<PathBuf>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut candidates = Vec::new();

    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Unreadable entry in {}: {}", directory.display(), e);
                errors.push(format!("{}: {}", directory.display(), e));
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        if !has_library_extension(&path) {
            debug!("Ignoring non-library file {}", path.display());
            continue;
        }
        candidates.push(path);
    }

    candidates
}

fn load_one<B: ModuleBackend>(
    backend: &B,
    path: &Path,
) -> Result<LoadedPlugin<B::Handle>, LoadError> {
    let handle = backend.open(path).map_err(LoadError::Open)?;

    let descriptor = backend
        .resolve(&handle, ENTRY_POINT_SYMBOL)
        .map_err(LoadError::MissingEntryPoint)
        .and_then(|entry| {
            // SAFETY: The symbol is the plugin factory; the module is open.
            let raw = unsafe { entry() };
            // SAFETY: A non-null descriptor points to module-owned storage.
            unsafe { validate_descriptor(raw) }.map_err(LoadError::InvalidDescriptor)
        });

    let descriptor = match descriptor {
        Ok(descriptor) => descriptor,
        Err(e) => {
            backend.close(handle);
            return Err(e);
        }
    };

    // SAFETY: Validated above, including a non-null name.
    let name = unsafe { descriptor.as_ref().name_lossy() };

    Ok(LoadedPlugin {
        path: path.to_path_buf(),
        name,
        descriptor: Some(descriptor),
        handle: Some(handle),
    })
}

/// Default plugin directory: `plugins` next to the running executable.
pub fn default_plugin_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to resolve executable path")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.join("plugins"))
}
