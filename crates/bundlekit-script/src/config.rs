//! Script host configuration

use std::path::PathBuf;

/// Configuration for a [`crate::LuaHost`]
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// Directory searched first for script files
    pub script_dir: PathBuf,
    /// Bundle name holding packed scripts as text assets
    pub script_bundle: String,
    /// Extension appended to module names for both strategies
    pub extension: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            script_dir: PathBuf::from("Lua"),
            script_bundle: "lua".to_string(),
            extension: ".lua".to_string(),
        }
    }
}
