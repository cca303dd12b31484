//! Minimal gtools plugin: counts the frames it has been asked to draw.

use std::sync::atomic::{AtomicU64, Ordering};

static FRAMES: AtomicU64 = AtomicU64::new(0);

extern "C" fn on_frame() {
    FRAMES.fetch_add(1, Ordering::Relaxed);
}

gtools_plugin_api::declare_plugin!("Hello Panel", on_frame);

/// Number of frames rendered since the module was loaded.
#[no_mangle]
pub extern "C" fn hello_panel_frames() -> u64 {
    FRAMES.load(Ordering::Relaxed)
}
