//! Shared library that does not export `GetPluginInfo`.

#[no_mangle]
pub extern "C" fn no_entry_panel_version() -> u32 {
    1
}
