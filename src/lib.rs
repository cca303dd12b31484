//! gtools - a terminal host for native plugin panels
//!
//! The host discovers shared libraries in a plugin directory, validates the
//! descriptor each one exports, and renders every visible plugin once per
//! frame inside a shared terminal UI.
//!
//! # Modules
//!
//! - [`plugins`]: plugin ABI, platform loader backend, discovery and unloading
//! - [`host`]: frame loop, visibility modes, dispatch and frame pacing
//! - [`config`]: configuration management and serialization

pub mod config;
pub mod host;
pub mod plugins;
