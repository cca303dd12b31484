//! Plugin ABI shared by the gtools host and every plugin module.
//!
//! A module exports exactly one symbol, [`ENTRY_POINT_SYMBOL`], with the
//! signature [`PluginEntryPoint`]. It returns a pointer to a [`PluginInfo`]
//! owned by the module, valid for as long as the module stays loaded.
//!
//! Plugin crates only need this crate and `crate-type = ["cdylib"]`.

use std::ffi::{c_char, CStr};

/// Name of the factory function every plugin module exports (NUL-terminated).
pub const ENTRY_POINT_SYMBOL: &[u8] = b"GetPluginInfo\0";

/// Per-frame render callback. Takes no arguments and carries no context.
pub type RenderFn = extern "C" fn();

/// Signature of the exported factory function.
pub type PluginEntryPoint = unsafe extern "C" fn() -> *const PluginInfo;

/// Fixed-layout plugin descriptor.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginInfo {
    /// Null-terminated display name.
    pub name: *const c_char,
    /// Render callback, invoked once per frame while the plugin is visible.
    pub on_frame: Option<RenderFn>,
}

impl PluginInfo {
    /// Read the display name.
    ///
    /// # Safety
    ///
    /// `name` must be non-null and point to a NUL-terminated string.
    pub unsafe fn name_lossy(&self) -> String {
        // SAFETY: Caller guarantees `name` is valid and NUL-terminated.
        unsafe { CStr::from_ptr(self.name).to_string_lossy().into_owned() }
    }
}

/// Descriptor wrapper that can live in a `static` inside a plugin module.
#[repr(transparent)]
pub struct StaticPluginInfo(PluginInfo);

// SAFETY: The descriptor only holds a pointer to immutable static string
// data and a plain function pointer. Neither is ever written through.
unsafe impl Sync for StaticPluginInfo {}

impl StaticPluginInfo {
    /// Build a descriptor from a NUL-terminated name and a render callback.
    ///
    /// Panics (at compile time when used in a `static`) if `name` is not
    /// NUL-terminated.
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        let bytes = name.as_bytes();
        assert!(
            !bytes.is_empty() && bytes[bytes.len() - 1] == 0,
            "plugin name must be NUL-terminated"
        );
        Self(PluginInfo {
            name: bytes.as_ptr().cast(),
            on_frame: Some(render),
        })
    }

    /// Wrap an arbitrary descriptor as-is.
    pub const fn from_info(info: PluginInfo) -> Self {
        Self(info)
    }

    /// Pointer handed back to the host from the factory function.
    pub const fn as_ptr(&self) -> *const PluginInfo {
        &self.0
    }
}

/// Export the plugin factory function from a `cdylib`.
///
/// ```ignore
/// extern "C" fn render() { /* draw one frame */ }
///
/// gtools_plugin_api::declare_plugin!("Json Formatter", render);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($name:expr, $render:path) => {
        #[no_mangle]
        #[allow(non_snake_case)]
        pub extern "C" fn GetPluginInfo() -> *const $crate::PluginInfo {
            static INFO: $crate::StaticPluginInfo =
                $crate::StaticPluginInfo::new(concat!($name, "\0"), $render);
            INFO.as_ptr()
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FRAMES: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_frame() {
        FRAMES.fetch_add(1, Ordering::SeqCst);
    }

    crate::declare_plugin!("Macro Panel", count_frame);

    #[test]
    fn test_declared_plugin_descriptor() {
        let info = unsafe { &*GetPluginInfo() };
        assert_eq!(unsafe { info.name_lossy() }, "Macro Panel");

        let before = FRAMES.load(Ordering::SeqCst);
        (info.on_frame.unwrap())();
        assert_eq!(FRAMES.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_factory_returns_same_static() {
        assert_eq!(GetPluginInfo(), GetPluginInfo());
    }

    #[test]
    fn test_from_info_keeps_fields() {
        static BARE: StaticPluginInfo = StaticPluginInfo::from_info(PluginInfo {
            name: std::ptr::null(),
            on_frame: None,
        });
        let info = unsafe { &*BARE.as_ptr() };
        assert!(info.name.is_null());
        assert!(info.on_frame.is_none());
    }
}
