//! In-memory module backend used by unit tests.
//!
//! Behaviour is picked from the file stem prefix:
//! `broken*` fails to open, `nosym*` lacks the factory, `nullinfo*`,
//! `norender*` and `noname*` return malformed descriptors, anything else
//! is a valid plugin named "Fake Panel".

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;
use std::ptr;

use super::abi::{PluginEntryPoint, PluginInfo, StaticPluginInfo, ENTRY_POINT_SYMBOL};
use super::backend::{BackendError, ModuleBackend};

extern "C" fn noop() {}

static GOOD: StaticPluginInfo = StaticPluginInfo::new("Fake Panel\0", noop);
static NO_RENDER: StaticPluginInfo = StaticPluginInfo::from_info(PluginInfo {
    name: b"No Render\0".as_ptr().cast(),
    on_frame: None,
});
static NO_NAME: StaticPluginInfo = StaticPluginInfo::from_info(PluginInfo {
    name: ptr::null(),
    on_frame: Some(noop),
});

extern "C" fn good_entry() -> *const PluginInfo {
    GOOD.as_ptr()
}

extern "C" fn no_render_entry() -> *const PluginInfo {
    NO_RENDER.as_ptr()
}

extern "C" fn no_name_entry() -> *const PluginInfo {
    NO_NAME.as_ptr()
}

extern "C" fn null_entry() -> *const PluginInfo {
    ptr::null()
}

#[derive(Debug)]
pub struct FakeHandle {
    id: usize,
    stem: String,
}

#[derive(Default)]
pub struct FakeBackend {
    next_id: Cell<usize>,
    open: RefCell<HashSet<usize>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open.borrow().len()
    }

    /// Successful opens over the backend's lifetime.
    pub fn opened_total(&self) -> usize {
        self.next_id.get()
    }
}

impl ModuleBackend for FakeBackend {
    type Handle = FakeHandle;

    fn open(&self, path: &Path) -> Result<FakeHandle, BackendError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.starts_with("broken") {
            return Err(BackendError::Open("not a loadable module".to_string()));
        }
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.open.borrow_mut().insert(id);
        Ok(FakeHandle { id, stem })
    }

    fn resolve(&self, handle: &FakeHandle, symbol: &[u8]) -> Result<PluginEntryPoint, BackendError> {
        assert!(self.open.borrow().contains(&handle.id), "resolve on closed handle");
        let missing = || BackendError::Resolve {
            symbol: String::from_utf8_lossy(symbol).into_owned(),
            reason: "undefined symbol".to_string(),
        };
        if symbol != ENTRY_POINT_SYMBOL || handle.stem.starts_with("nosym") {
            return Err(missing());
        }
        let entry: PluginEntryPoint = if handle.stem.starts_with("nullinfo") {
            null_entry
        } else if handle.stem.starts_with("norender") {
            no_render_entry
        } else if handle.stem.starts_with("noname") {
            no_name_entry
        } else {
            good_entry
        };
        Ok(entry)
    }

    fn close(&self, handle: FakeHandle) {
        let removed = self.open.borrow_mut().remove(&handle.id);
        assert!(removed, "handle {} closed twice", handle.id);
    }
}

/// Create an empty file named `name` inside `dir`.
pub fn touch(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"").unwrap();
}
