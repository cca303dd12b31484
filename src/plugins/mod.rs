// Plugin runtime: native module discovery, loading and unloading.
//
// - abi: descriptor validation on top of the gtools-plugin-api layout
// - backend: platform loader primitives behind one trait
// - loader: directory scan and per-module validation
// - lifecycle: bulk release of module handles at shutdown

pub mod abi;
pub mod backend;
pub mod lifecycle;
pub mod loader;

#[cfg(test)]
pub(crate) mod testing;

pub use abi::{declare_plugin, PluginInfo, StaticPluginInfo, ENTRY_POINT_SYMBOL};
pub use backend::{ModuleBackend, ModuleHandle, NativeBackend, NATIVE_LIBRARY_EXTENSION};
pub use lifecycle::{unload_plugins, unload_plugins_with};
pub use loader::{
    default_plugin_dir, load_plugins, load_plugins_with, resolve_and_load, LoadError, LoadOptions,
    LoadResult, LoadedPlugin,
};
