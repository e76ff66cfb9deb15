//! Error types for the Lua host and module resolution

use bundlekit_store::StoreError;
use thiserror::Error;

/// Script operation result type
pub type Result<T> = std::result::Result<T, ScriptError>;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("lua host is not initialized")]
    NotInitialized,

    #[error("lua host has been disposed")]
    Disposed,

    #[error("no loader produced module {module}")]
    ModuleNotFound { module: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lua(#[from] mlua::Error),
}
