//! Recovery engine lifecycle binding and helper registration
//!
//! The [`RecoveryRegistrar`] ties the recovery engine to the host process
//! lifecycle: the host delivers its "application ready" and "shutdown"
//! signals, the registrar translates them into engine lifecycle calls and
//! wires recovery helpers into the engine's recovery module. The engine is
//! an injected collaborator, not a process-global lookup.

use crate::error::{RecoveryError, RecoveryResult};
use crate::recovery::RecoveryHelper;
use std::sync::Arc;

/// The recovery module living inside a started engine. Helpers are kept in
/// registration order; nothing deduplicates them.
pub trait RecoveryModule: Send + Sync {
    fn add_helper(&self, helper: Arc<dyn RecoveryHelper>);
}

/// Lifecycle surface of the recovery engine
pub trait RecoveryService: Send + Sync {
    fn create(&self) -> RecoveryResult<()>;

    fn start(&self) -> RecoveryResult<()>;

    fn stop(&self) -> RecoveryResult<()>;

    fn destroy(&self) -> RecoveryResult<()>;

    /// The engine's recovery module, or `None` while the engine has not
    /// registered one.
    fn recovery_module(&self) -> Option<Arc<dyn RecoveryModule>>;
}

/// Binds a recovery engine to the host lifecycle and registers helpers
pub struct RecoveryRegistrar {
    service: Arc<dyn RecoveryService>,
}

impl RecoveryRegistrar {
    pub fn new(service: Arc<dyn RecoveryService>) -> Self {
        Self { service }
    }

    /// Host signal: the application is ready. Creates then starts the
    /// engine.
    pub fn on_application_ready(&self) -> RecoveryResult<()> {
        self.service.create()?;
        self.service.start()
    }

    /// Host signal: the application is shutting down. Stops then destroys
    /// the engine, in that order.
    pub fn on_shutdown(&self) -> RecoveryResult<()> {
        self.service.stop()?;
        self.service.destroy()
    }

    /// Register a recovery helper with the engine's recovery module. Must
    /// only be called once the module is live; an absent module is a fatal
    /// misconfiguration.
    pub fn register_helper(&self, helper: Arc<dyn RecoveryHelper>) -> RecoveryResult<()> {
        let module = self
            .service
            .recovery_module()
            .ok_or(RecoveryError::ModuleNotRegistered)?;
        module.add_helper(helper);
        Ok(())
    }
}
