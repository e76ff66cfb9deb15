//! Embedded Lua scripting for BundleKit
//!
//! [`LuaHost`] wraps an mlua interpreter behind an explicit
//! Uninitialized → Ready → Disposed lifecycle. Module loads requested via
//! Lua's `require` are redirected through a [`ModuleResolver`] that tries
//! two strategies in fixed order: a script file on local disk, then a text
//! asset inside the bundle literally named `"lua"` served by a
//! [`bundlekit_store::BundleStore`]. The resolver caches nothing; every
//! resolution re-queries its sources.

pub mod config;
pub mod error;
pub mod host;
pub mod resolver;

pub use config::ScriptConfig;
pub use error::{Result, ScriptError};
pub use host::LuaHost;
pub use resolver::{BundleModuleSource, DirModuleSource, ModuleResolver, ModuleSource};
