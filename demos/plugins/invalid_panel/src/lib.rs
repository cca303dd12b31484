//! Plugin whose descriptor has no render callback. The host must reject it.

use gtools_plugin_api::{PluginInfo, StaticPluginInfo};

static INFO: StaticPluginInfo = StaticPluginInfo::from_info(PluginInfo {
    name: b"Invalid Panel\0".as_ptr().cast(),
    on_frame: None,
});

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn GetPluginInfo() -> *const PluginInfo {
    INFO.as_ptr()
}
