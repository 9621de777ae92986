//! In-process simulated hub.
//!
//! Serves a fixed set of modules described in code or in a JSON file, and can
//! be scripted to raise session faults at chosen points or to refuse
//! registration. Once [`SimulatedHub::log`] has been asked for, every session
//! call is recorded in a [`SessionLog`] that stays readable after the hub has
//! been moved into a collector or supervisor. A hub nobody observes records
//! nothing.

use crate::device::data::{FunctionKind, FunctionReading, ModuleId, ModuleInfo};
use crate::device::traits::{DeviceSession, RegistrationError, SessionFault};
use crate::error::{ExporterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tokio::time::Instant;

const SIMULATED_TRANSPORT: &str = "simulated";

/// A simulated module and its functions, index 0 first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedModule {
    pub serial_number: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub logical_name: String,
    #[serde(default)]
    pub usb_current_ma: f64,
    #[serde(default)]
    pub luminosity_percent: f64,
    #[serde(default)]
    pub functions: Vec<FunctionReading>,
}

impl SimulatedModule {
    /// A module whose index 0 holds the data logger, like real hardware.
    pub fn new(serial_number: impl Into<String>, logical_name: impl Into<String>) -> Self {
        Self {
            serial_number: serial_number.into(),
            product_name: "Yocto-Simulated".to_string(),
            logical_name: logical_name.into(),
            usb_current_ma: 0.0,
            luminosity_percent: 0.0,
            functions: vec![FunctionReading::new(
                FunctionKind::DataLogger,
                "dataLogger",
                "OFF",
            )],
        }
    }

    pub fn with_usb_current(mut self, milliamps: f64) -> Self {
        self.usb_current_ma = milliamps;
        self
    }

    pub fn with_luminosity(mut self, percent: f64) -> Self {
        self.luminosity_percent = percent;
        self
    }

    /// Append a function after the existing ones.
    pub fn with_function(mut self, kind: FunctionKind, value: impl Into<String>) -> Self {
        let name = lower_camel(kind.type_name());
        self.functions.push(FunctionReading::new(kind, name, value));
        self
    }

    fn info(&self) -> ModuleInfo {
        let friendly_name = if self.logical_name.is_empty() {
            self.serial_number.clone()
        } else {
            self.logical_name.clone()
        };
        ModuleInfo {
            serial_number: self.serial_number.clone(),
            product_name: self.product_name.clone(),
            friendly_name,
            hardware_id: format!("{}.module", self.serial_number),
            usb_current_ma: self.usb_current_ma,
            luminosity_percent: self.luminosity_percent,
            function_count: self.functions.len(),
        }
    }
}

fn lower_camel(type_name: &str) -> String {
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// JSON layout accepted by [`SimulatedHub::from_json_str`].
///
/// ```json
/// {
///   "modules": [{"serial_number": "METEOMK1-00001", "functions": []}],
///   "faults": [{"point": "enumeration", "occurrence": 2}],
///   "refuse_registration_from": 2
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatedHubConfig {
    #[serde(default)]
    pub modules: Vec<SimulatedModule>,
    /// One-shot faults, fired in order
    #[serde(default)]
    pub faults: Vec<ScriptedFault>,
    /// First registration attempt (1-based) to refuse, and every one after it
    #[serde(default)]
    pub refuse_registration_from: Option<usize>,
}

/// A fault entry in a hub description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedFault {
    pub point: FaultPoint,
    /// Matching call (1-based) on which the fault fires
    #[serde(default = "first_occurrence")]
    pub occurrence: usize,
}

fn first_occurrence() -> usize {
    1
}

/// A point at which a scripted session fault fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPoint {
    /// The next module enumeration
    Enumeration,
    /// The next module-info read of the given serial
    ModuleInfo { serial: String },
    /// The next read of function `index` on the given serial
    FunctionRead { serial: String, index: usize },
}

/// What happened on the simulated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    Registered,
    RegistrationRefused,
    Unregistered,
    Enumerated,
    FunctionRead { serial: String, index: usize },
    FaultRaised,
}

/// A recorded session call.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub at: Instant,
    pub kind: SessionEventKind,
}

/// Shared, clonable record of session calls.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl SessionLog {
    fn push(&self, kind: SessionEventKind) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SessionEvent {
                at: Instant::now(),
                kind,
            });
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded event kinds, oldest first.
    pub fn kinds(&self) -> Vec<SessionEventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }

    /// Number of events matching `kind`.
    pub fn count(&self, kind: &SessionEventKind) -> usize {
        self.events().iter().filter(|e| &e.kind == kind).count()
    }
}

/// Simulated hub session.
#[derive(Debug)]
pub struct SimulatedHub {
    modules: Vec<SimulatedModule>,
    registered: bool,
    registration_attempts: usize,
    refuse_registration_from: Option<usize>,
    faults: VecDeque<(FaultPoint, usize)>,
    log: OnceLock<SessionLog>,
}

impl SimulatedHub {
    pub fn new(modules: Vec<SimulatedModule>) -> Self {
        Self {
            modules,
            registered: false,
            registration_attempts: 0,
            refuse_registration_from: None,
            faults: VecDeque::new(),
            log: OnceLock::new(),
        }
    }

    /// Build a hub from a parsed description, faults and refusals included.
    pub fn from_config(config: SimulatedHubConfig) -> Self {
        let mut hub = Self::new(config.modules);
        for fault in config.faults {
            hub = hub.with_fault_on_occurrence(fault.point, fault.occurrence);
        }
        hub.refuse_registration_from = config.refuse_registration_from;
        hub
    }

    /// Parse a hub description such as `{"modules": [...]}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulatedHubConfig = serde_json::from_str(json)
            .map_err(|e| ExporterError::config_error(format!("Invalid simulated hub: {}", e)))?;
        Ok(Self::from_config(config))
    }

    /// Load a hub description from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Schedule a one-shot fault. Faults fire in the order they were scheduled.
    pub fn with_fault(self, point: FaultPoint) -> Self {
        self.with_fault_on_occurrence(point, 1)
    }

    /// Schedule a one-shot fault on the `occurrence`-th matching call (1-based),
    /// counted once the previously scheduled faults have fired.
    pub fn with_fault_on_occurrence(mut self, point: FaultPoint, occurrence: usize) -> Self {
        self.faults.push_back((point, occurrence.saturating_sub(1)));
        self
    }

    /// Refuse every registration attempt numbered `attempt` or later (1-based).
    pub fn refuse_registration_from(mut self, attempt: usize) -> Self {
        self.refuse_registration_from = Some(attempt);
        self
    }

    /// Handle to the call log. Recording starts with the first call.
    pub fn log(&self) -> SessionLog {
        self.log.get_or_init(SessionLog::default).clone()
    }

    fn record(&self, kind: SessionEventKind) {
        if let Some(log) = self.log.get() {
            log.push(kind);
        }
    }

    fn ensure_registered(&self) -> std::result::Result<(), SessionFault> {
        if self.registered {
            Ok(())
        } else {
            Err(SessionFault::new("hub is not registered"))
        }
    }

    fn trip(&mut self, point: &FaultPoint) -> std::result::Result<(), SessionFault> {
        match self.faults.front_mut() {
            Some((scheduled, skips)) if scheduled == point => {
                if *skips > 0 {
                    *skips -= 1;
                    return Ok(());
                }
                self.faults.pop_front();
                self.record(SessionEventKind::FaultRaised);
                Err(SessionFault::new(format!("simulated fault at {:?}", point)))
            }
            _ => Ok(()),
        }
    }

    fn find(&self, module: &ModuleId) -> std::result::Result<&SimulatedModule, SessionFault> {
        self.modules
            .iter()
            .find(|m| m.serial_number == module.as_str())
            .ok_or_else(|| SessionFault::new(format!("device not found: {}", module)))
    }
}

#[async_trait]
impl DeviceSession for SimulatedHub {
    fn transport(&self) -> &str {
        SIMULATED_TRANSPORT
    }

    async fn register_hub(&mut self) -> std::result::Result<(), RegistrationError> {
        self.registration_attempts += 1;
        if let Some(from) = self.refuse_registration_from {
            if self.registration_attempts >= from {
                self.record(SessionEventKind::RegistrationRefused);
                return Err(RegistrationError::new(SIMULATED_TRANSPORT, "no hub reachable"));
            }
        }
        self.registered = true;
        self.record(SessionEventKind::Registered);
        Ok(())
    }

    async fn unregister_hub(&mut self) {
        self.registered = false;
        self.record(SessionEventKind::Unregistered);
    }

    async fn enumerate_modules(&mut self) -> std::result::Result<Vec<ModuleId>, SessionFault> {
        self.ensure_registered()?;
        self.trip(&FaultPoint::Enumeration)?;
        self.record(SessionEventKind::Enumerated);
        Ok(self
            .modules
            .iter()
            .map(|m| ModuleId::new(m.serial_number.clone()))
            .collect())
    }

    async fn module_info(
        &mut self,
        module: &ModuleId,
    ) -> std::result::Result<ModuleInfo, SessionFault> {
        self.ensure_registered()?;
        self.trip(&FaultPoint::ModuleInfo {
            serial: module.to_string(),
        })?;
        Ok(self.find(module)?.info())
    }

    async fn function_reading(
        &mut self,
        module: &ModuleId,
        index: usize,
    ) -> std::result::Result<FunctionReading, SessionFault> {
        self.ensure_registered()?;
        self.trip(&FaultPoint::FunctionRead {
            serial: module.to_string(),
            index,
        })?;
        let reading = self
            .find(module)?
            .functions
            .get(index)
            .cloned()
            .ok_or_else(|| {
                SessionFault::new(format!("function index {} out of range on {}", index, module))
            })?;
        self.record(SessionEventKind::FunctionRead {
            serial: module.to_string(),
            index,
        });
        Ok(reading)
    }
}
