use tracing::{debug, info};

use super::backend::{ModuleBackend, ModuleHandle, NativeBackend};
use super::loader::LoadedPlugin;

/// Close every loaded module and empty the collection.
///
/// Must run after the last frame that could call into any plugin. A second
/// call sees an empty collection and does nothing.
pub fn unload_plugins(plugins: &mut Vec<LoadedPlugin<ModuleHandle>>) {
    unload_plugins_with(&NativeBackend, plugins);
}

/// Close every loaded module through an explicit backend.
pub fn unload_plugins_with<B: ModuleBackend>(
    backend: &B,
    plugins: &mut Vec<LoadedPlugin<B::Handle>>,
) {
    if plugins.is_empty() {
        return;
    }

    let count = plugins.len();
    for plugin in plugins.iter_mut() {
        if let Some(handle) = plugin.release() {
            debug!("Unloading plugin '{}'", plugin.name());
            backend.close(handle);
        }
    }
    plugins.clear();

    info!("Unloaded {} plugins", count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::backend::NATIVE_LIBRARY_EXTENSION;
    use crate::plugins::loader::{load_plugins_with, LoadOptions};
    use crate::plugins::testing::{touch, FakeBackend};

    #[test]
    fn test_unload_closes_every_handle() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            touch(dir.path(), &format!("{name}.{NATIVE_LIBRARY_EXTENSION}"));
        }
        let backend = FakeBackend::new();
        let mut result = load_plugins_with(&backend, dir.path(), LoadOptions::default());
        assert_eq!(backend.open_handles(), 3);

        unload_plugins_with(&backend, &mut result.plugins);

        assert!(result.plugins.is_empty());
        assert_eq!(backend.open_handles(), 0);
    }

    #[test]
    fn test_unload_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &format!("a.{NATIVE_LIBRARY_EXTENSION}"));
        let backend = FakeBackend::new();
        let mut result = load_plugins_with(&backend, dir.path(), LoadOptions::default());

        unload_plugins_with(&backend, &mut result.plugins);
        // FakeBackend panics on a double close.
        unload_plugins_with(&backend, &mut result.plugins);

        assert!(result.plugins.is_empty());
        assert_eq!(backend.open_handles(), 0);
    }

    #[test]
    fn test_release_clears_descriptor_and_handle() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &format!("a.{NATIVE_LIBRARY_EXTENSION}"));
        let backend = FakeBackend::new();
        let mut result = load_plugins_with(&backend, dir.path(), LoadOptions::default());

        let plugin = &mut result.plugins[0];
        let handle = plugin.release().unwrap();
        assert!(!plugin.is_loaded());
        assert!(plugin.release().is_none());
        // Render after release must not reach module memory.
        plugin.render();
        backend.close(handle);
    }

    #[test]
    fn test_unload_native_empty() {
        let mut plugins = Vec::new();
        unload_plugins(&mut plugins);
        unload_plugins(&mut plugins);
        assert!(plugins.is_empty());
    }
}
