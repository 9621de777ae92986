//! Data structures describing modules and their sensor functions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a module for the duration of one enumeration.
///
/// Wraps the module serial number. Identifiers are only meaningful inside
/// the pass that produced them; modules are re-enumerated every pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(serial: impl Into<String>) -> Self {
        Self(serial.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module-level readings and identity, read once per pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// Serial number (e.g. "METEOMK1-12345")
    pub serial_number: String,
    /// Product name (e.g. "Yocto-Meteo")
    pub product_name: String,
    /// Logical name if set, otherwise the serial number; keys the `hardware_id` label
    pub friendly_name: String,
    /// Vendor hardware id (e.g. "METEOMK1-12345.module")
    pub hardware_id: String,
    /// Current drawn on the USB bus in milliamps
    pub usb_current_ma: f64,
    /// Beacon luminosity in percent (0.0 to 100.0)
    pub luminosity_percent: f64,
    /// Number of functions, index 0 included
    pub function_count: usize,
}

/// Type of a module function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FunctionKind {
    Temperature,
    Pressure,
    Humidity,
    LightSensor,
    CarbonDioxide,
    /// The reserved data-logger function, always at index 0
    DataLogger,
    /// Any other vendor function type, kept verbatim
    Other(String),
}

impl FunctionKind {
    /// Parse a vendor function type name such as `"Temperature"` or `"LightSensor"`.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "Temperature" => Self::Temperature,
            "Pressure" => Self::Pressure,
            "Humidity" => Self::Humidity,
            "LightSensor" => Self::LightSensor,
            "CarbonDioxide" => Self::CarbonDioxide,
            "DataLogger" => Self::DataLogger,
            other => Self::Other(other.to_string()),
        }
    }

    /// The vendor function type name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Temperature => "Temperature",
            Self::Pressure => "Pressure",
            Self::Humidity => "Humidity",
            Self::LightSensor => "LightSensor",
            Self::CarbonDioxide => "CarbonDioxide",
            Self::DataLogger => "DataLogger",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for FunctionKind {
    fn from(name: String) -> Self {
        Self::from_type_name(&name)
    }
}

impl From<FunctionKind> for String {
    fn from(kind: FunctionKind) -> Self {
        kind.type_name().to_string()
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One reading of a function channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionReading {
    /// Function type
    pub kind: FunctionKind,
    /// Function name as reported by the hub (e.g. "temperature")
    pub name: String,
    /// Advertised value, as reported by the hub
    pub value: String,
}

impl FunctionReading {
    pub fn new(kind: FunctionKind, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
        }
    }

    /// The advertised value as a number, if it is one.
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}
