//! Host-facing feature modules.
//!
//! A host (the CLI here, a desktop shell elsewhere) registers modules with an
//! [`AppManager`], starts them once with an [`AppContext`], then calls their
//! methods directly. Module methods return `Result<T, String>` with a
//! What/Why/Fix message ready to show to a user.

mod login_app;

use std::any::Any;

use tracing::debug;

use crate::config::PortalConfig;

pub use login_app::LoginApp;

/// Everything a module may capture at startup.
#[derive(Debug, Clone, Default)]
pub struct AppContext {
    /// Runtime configuration.
    pub config: PortalConfig,
}

impl AppContext {
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }
}

/// A feature module bound into the host.
pub trait AppModule: Any + Send + Sync {
    /// Stable module name.
    fn name(&self) -> &'static str;

    /// Called once before any other method.
    fn startup(&mut self, ctx: &AppContext);
}

/// Owns the registered modules and runs their startup.
#[derive(Default)]
pub struct AppManager {
    modules: Vec<Box<dyn AppModule>>,
}

impl std::fmt::Debug for AppManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppManager")
            .field("modules", &self.names())
            .finish()
    }
}

impl AppManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with every module this crate ships.
    #[must_use]
    pub fn with_default_modules() -> Self {
        let mut manager = Self::new();
        manager.register(Box::new(LoginApp::new()));
        manager
    }

    /// Adds a module. Registration order is startup order.
    pub fn register(&mut self, module: Box<dyn AppModule>) {
        self.modules.push(module);
    }

    /// Runs `startup` on every module in registration order.
    pub fn startup(&mut self, ctx: &AppContext) {
        for module in &mut self.modules {
            debug!(module = module.name(), "Starting module");
            module.startup(ctx);
        }
    }

    /// Names of the bound modules.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// The first registered module of type `T`.
    #[must_use]
    pub fn get<T: AppModule>(&self) -> Option<&T> {
        self.modules.iter().find_map(|module| {
            let any: &dyn Any = &**module;
            any.downcast_ref::<T>()
        })
    }
}
