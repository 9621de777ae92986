//! Access to the sensor hardware.
//!
//! The hardware session is an owned [`DeviceSession`] with an explicit
//! register/unregister lifecycle. Two backends exist: the VirtualHub HTTP
//! backend for real modules (feature `virtualhub`) and an in-process
//! [`SimulatedHub`] for tests and demos.

pub mod data;
pub mod inventory;
pub mod simulated;
pub mod traits;

#[cfg(feature = "virtualhub")]
pub mod virtualhub;

// Re-export commonly used items
pub use data::{FunctionKind, FunctionReading, ModuleId, ModuleInfo};
pub use inventory::{take_inventory, ModuleInventory};
pub use simulated::{SimulatedHub, SimulatedModule};
pub use traits::{DeviceSession, RegistrationError, SessionFault};

#[cfg(feature = "virtualhub")]
pub use virtualhub::VirtualHubSession;
