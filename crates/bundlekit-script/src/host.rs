//! Lua interpreter host
//!
//! The host owns the interpreter and its lifecycle:
//! Uninitialized → Ready → Disposed. Execution operations require Ready and
//! return an explicit error otherwise. Disposal is final; a disposed host
//! cannot be re-initialized.

use std::sync::Arc;

use mlua::{Function, Lua, Table, Value};
use tracing::{debug, info};

use bundlekit_store::BundleStore;

use crate::config::ScriptConfig;
use crate::error::{Result, ScriptError};
use crate::resolver::ModuleResolver;

enum HostState {
    Uninitialized,
    Ready(Lua),
    Disposed,
}

/// Embedded Lua interpreter with store-backed module resolution
pub struct LuaHost {
    resolver: Arc<ModuleResolver>,
    state: HostState,
}

impl LuaHost {
    /// Create an uninitialized host resolving modules from disk and from
    /// the store's script bundle
    pub fn new(store: Arc<BundleStore>, config: ScriptConfig) -> Self {
        Self::with_resolver(ModuleResolver::new(store, &config))
    }

    /// Create an uninitialized host with a custom resolver chain
    pub fn with_resolver(resolver: ModuleResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
            state: HostState::Uninitialized,
        }
    }

    /// Create the interpreter and hook module resolution into `require`
    ///
    /// No-op while Ready; fails once the host has been disposed.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            HostState::Ready(_) => return Ok(()),
            HostState::Disposed => return Err(ScriptError::Disposed),
            HostState::Uninitialized => {}
        }

        let lua = Lua::new();
        install_searcher(&lua, Arc::clone(&self.resolver))?;
        self.state = HostState::Ready(lua);
        info!("lua host ready");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, HostState::Ready(_))
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, HostState::Disposed)
    }

    /// Execute a chunk of Lua source
    pub fn exec(&self, chunk: &str) -> Result<()> {
        let lua = self.lua()?;
        lua.load(chunk).exec()?;
        Ok(())
    }

    /// Run a module through `require`, engaging the resolver chain
    pub fn run_module(&self, module: &str) -> Result<()> {
        let lua = self.lua()?;
        debug!(module, "running module");
        let require: Function = lua.globals().get("require")?;
        require.call::<()>(module)?;
        Ok(())
    }

    /// The interpreter's globals table
    pub fn globals(&self) -> Result<Table> {
        Ok(self.lua()?.globals())
    }

    /// Drive a full garbage-collection cycle
    pub fn collect_garbage(&self) -> Result<()> {
        self.lua()?.gc_collect()?;
        Ok(())
    }

    /// Release the interpreter. Idempotent; the host stays Disposed.
    pub fn dispose(&mut self) {
        if matches!(self.state, HostState::Ready(_)) {
            info!("lua host disposed");
        }
        self.state = HostState::Disposed;
    }

    fn lua(&self) -> Result<&Lua> {
        match &self.state {
            HostState::Ready(lua) => Ok(lua),
            HostState::Uninitialized => Err(ScriptError::NotInitialized),
            HostState::Disposed => Err(ScriptError::Disposed),
        }
    }
}

/// Insert the resolver as a `package.searchers` entry, right after the
/// preload searcher so packed scripts shadow Lua's stock path lookup.
fn install_searcher(lua: &Lua, resolver: Arc<ModuleResolver>) -> Result<()> {
    let searcher = lua.create_function(move |lua, module: String| {
        match resolver.resolve(&module) {
            Ok(bytes) => {
                let function = lua.load(&bytes[..]).set_name(&module).into_function()?;
                Ok(Value::Function(function))
            }
            // Let require aggregate the miss into its own error message.
            Err(ScriptError::ModuleNotFound { module }) => {
                let message =
                    lua.create_string(format!("\n\tno file or bundled script for '{module}'"))?;
                Ok(Value::String(message))
            }
            Err(other) => Err(mlua::Error::external(other)),
        }
    })?;

    let package: Table = lua.globals().get("package")?;
    let searchers: Table = package.get("searchers")?;
    searchers.raw_insert(2, searcher)?;
    Ok(())
}
