//! Host side of the plugin ABI.
//!
//! The layout itself lives in the `gtools-plugin-api` crate so that plugin
//! modules can build against it without pulling in the host. This module
//! re-exports it and adds descriptor validation.

use std::ptr::NonNull;
use thiserror::Error;

pub use gtools_plugin_api::{
    declare_plugin, PluginEntryPoint, PluginInfo, RenderFn, StaticPluginInfo, ENTRY_POINT_SYMBOL,
};

/// Reasons a descriptor is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DescriptorDefect {
    #[error("factory returned a null descriptor")]
    NullDescriptor,
    #[error("descriptor has a null name")]
    NullName,
    #[error("descriptor has no render callback")]
    NullRender,
}

/// Check a descriptor returned by a module's factory function.
///
/// # Safety
///
/// `descriptor` must be null or point to a readable `PluginInfo`.
pub unsafe fn validate_descriptor(
    descriptor: *const PluginInfo,
) -> Result<NonNull<PluginInfo>, DescriptorDefect> {
    let ptr = NonNull::new(descriptor.cast_mut()).ok_or(DescriptorDefect::NullDescriptor)?;
    // SAFETY: Non-null, and the caller guarantees it is readable.
    let info = unsafe { ptr.as_ref() };
    if info.name.is_null() {
        return Err(DescriptorDefect::NullName);
    }
    if info.on_frame.is_none() {
        return Err(DescriptorDefect::NullRender);
    }
    Ok(ptr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FRAMES: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_frame() {
        FRAMES.fetch_add(1, Ordering::SeqCst);
    }

    declare_plugin!("Macro Panel", count_frame);

    #[test]
    fn test_declared_plugin_is_valid() {
        let info = unsafe { validate_descriptor(GetPluginInfo()) }.unwrap();
        let info = unsafe { info.as_ref() };
        assert_eq!(unsafe { info.name_lossy() }, "Macro Panel");

        let before = FRAMES.load(Ordering::SeqCst);
        (info.on_frame.unwrap())();
        assert_eq!(FRAMES.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_null_descriptor_rejected() {
        let result = unsafe { validate_descriptor(ptr::null()) };
        assert_eq!(result, Err(DescriptorDefect::NullDescriptor));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let no_render = PluginInfo {
            name: b"x\0".as_ptr().cast(),
            on_frame: None,
        };
        let no_name = PluginInfo {
            name: ptr::null(),
            on_frame: Some(count_frame),
        };
        assert_eq!(
            unsafe { validate_descriptor(&no_render) },
            Err(DescriptorDefect::NullRender)
        );
        assert_eq!(
            unsafe { validate_descriptor(&no_name) },
            Err(DescriptorDefect::NullName)
        );
    }

    #[test]
    fn test_defect_messages() {
        assert_eq!(
            DescriptorDefect::NullRender.to_string(),
            "descriptor has no render callback"
        );
        assert_eq!(
            DescriptorDefect::NullDescriptor.to_string(),
            "factory returned a null descriptor"
        );
    }
}
