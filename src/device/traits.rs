//! The hardware session capability and its error types.

use crate::device::data::{FunctionReading, ModuleId, ModuleInfo};
use async_trait::async_trait;

/// A fault of the hardware session raised while a pass is running.
///
/// Recoverable: the supervisor tears the session down and re-registers it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("hardware session fault: {message}")]
pub struct SessionFault {
    pub message: String,
}

impl SessionFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to acquire the hardware session. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("RegisterHub error on {transport}: {message}")]
pub struct RegistrationError {
    pub transport: String,
    pub message: String,
}

impl RegistrationError {
    pub fn new(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            transport: transport.into(),
            message: message.into(),
        }
    }
}

/// An owned session to the local hardware bus.
///
/// The session carries its own transport; `register_hub` and `unregister_hub`
/// make the acquisition lifecycle explicit. Accessors fail with a
/// [`SessionFault`] when the session breaks. Calls are never timed out.
#[async_trait]
pub trait DeviceSession: Send {
    /// Human-readable transport description (e.g. a hub URL).
    fn transport(&self) -> &str;

    /// Acquire the hardware bus.
    async fn register_hub(&mut self) -> Result<(), RegistrationError>;

    /// Release the hardware bus. Infallible; releasing a released session is a no-op.
    async fn unregister_hub(&mut self);

    /// List the modules currently attached, in hub order.
    async fn enumerate_modules(&mut self) -> Result<Vec<ModuleId>, SessionFault>;

    /// Read identity and module-level readings of one module.
    async fn module_info(&mut self, module: &ModuleId) -> Result<ModuleInfo, SessionFault>;

    /// Read the function at `index` in `[0, function_count)`.
    async fn function_reading(
        &mut self,
        module: &ModuleId,
        index: usize,
    ) -> Result<FunctionReading, SessionFault>;
}

#[async_trait]
impl<S: DeviceSession + ?Sized> DeviceSession for Box<S> {
    fn transport(&self) -> &str {
        (**self).transport()
    }

    async fn register_hub(&mut self) -> Result<(), RegistrationError> {
        (**self).register_hub().await
    }

    async fn unregister_hub(&mut self) {
        (**self).unregister_hub().await
    }

    async fn enumerate_modules(&mut self) -> Result<Vec<ModuleId>, SessionFault> {
        (**self).enumerate_modules().await
    }

    async fn module_info(&mut self, module: &ModuleId) -> Result<ModuleInfo, SessionFault> {
        (**self).module_info(module).await
    }

    async fn function_reading(
        &mut self,
        module: &ModuleId,
        index: usize,
    ) -> Result<FunctionReading, SessionFault> {
        (**self).function_reading(module, index).await
    }
}
