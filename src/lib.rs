//! # Yocto Exporter - Prometheus exporter for Yoctopuce sensors
//!
//! Polls locally attached Yoctopuce modules and republishes their readings as
//! Prometheus gauges. Collection and scraping are decoupled: a supervised
//! collection loop writes into a shared [`MetricsRegistry`], and the scrape
//! server reads whatever was last written.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yocto_exporter::{
//!     start_web_server, Collector, DeviceSession, MetricsRegistry, SimulatedHub, Supervisor,
//!     WebConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut hub = SimulatedHub::from_json_file("hub.json")?;
//!     hub.register_hub().await?;
//!
//!     let registry = Arc::new(MetricsRegistry::new()?);
//!     let mut supervisor = Supervisor::new(Collector::new(hub, registry.clone()), false);
//!     supervisor.step().await?;
//!
//!     tokio::spawn(start_web_server(WebConfig::default(), registry));
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod metrics;
pub mod supervisor;
pub mod web;

// Re-export public API
pub use device::{
    DeviceSession, FunctionKind, FunctionReading, ModuleId, ModuleInfo, RegistrationError,
    SessionFault, SimulatedHub, SimulatedModule,
};
pub use error::{ExporterError, Result};
pub use metrics::{Collector, MetricsRegistry, PassCounter, PassSummary, SensorGauge};
pub use supervisor::{Supervisor, SupervisorState};

#[cfg(feature = "virtualhub")]
pub use device::VirtualHubSession;

pub use web::{start_web_server, WebConfig};

/// The default scrape server port
pub const DEFAULT_WEB_PORT: u16 = 8000;

/// The default scrape server bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
