//! Hardware session over the Yoctopuce VirtualHub / YoctoHub HTTP JSON API.
//!
//! The hub lists attached devices in `/api/services/whitePages.json` and
//! serves each device tree at `/bySerial/{serial}/api.json`. A device tree is
//! a JSON object keyed by function id (`"module"`, `"temperature"`,
//! `"dataLogger"`, ...) in device order.

use crate::device::data::{FunctionKind, FunctionReading, ModuleId, ModuleInfo};
use crate::device::traits::{DeviceSession, RegistrationError, SessionFault};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Default VirtualHub address.
pub const DEFAULT_HUB_URL: &str = "http://127.0.0.1:4444";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WhitePageEntry {
    serial_number: String,
}

/// A device tree fetched once per pass.
#[derive(Debug, Clone)]
struct DeviceTree {
    info: ModuleInfo,
    functions: Vec<FunctionReading>,
}

/// Session backed by a VirtualHub or YoctoHub reachable over HTTP.
pub struct VirtualHubSession {
    base_url: String,
    client: Option<reqwest::Client>,
    devices: HashMap<ModuleId, DeviceTree>,
}

impl VirtualHubSession {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: None,
            devices: HashMap::new(),
        }
    }

    fn client(&self) -> Result<&reqwest::Client, SessionFault> {
        self.client
            .as_ref()
            .ok_or_else(|| SessionFault::new("hub is not registered"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, SessionFault> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self
            .client()?
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SessionFault::new(format!("{}: {}", url, e)))?;
        response
            .json::<T>()
            .await
            .map_err(|e| SessionFault::new(format!("{}: invalid JSON: {}", url, e)))
    }

    async fn device(&mut self, module: &ModuleId) -> Result<&DeviceTree, SessionFault> {
        if !self.devices.contains_key(module) {
            let tree: Map<String, Value> = self
                .get_json(&format!("/bySerial/{}/api.json", module))
                .await?;
            let device = parse_device_tree(module, &tree)?;
            self.devices.insert(module.clone(), device);
        }
        self.devices
            .get(module)
            .ok_or_else(|| SessionFault::new(format!("device not found: {}", module)))
    }
}

/// Turn a function id such as `"lightSensor2"` into its type name `"LightSensor"`.
fn function_type_name(function_id: &str) -> String {
    let base = function_id.trim_end_matches(|c: char| c.is_ascii_digit());
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn text_field(object: &Value, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn number_field(object: &Value, key: &str) -> Result<f64, SessionFault> {
    let value = object
        .get(key)
        .ok_or_else(|| SessionFault::new(format!("module attribute {} missing", key)))?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SessionFault::new(format!("module attribute {} is not numeric", key)))
}

fn parse_device_tree(
    module: &ModuleId,
    tree: &Map<String, Value>,
) -> Result<DeviceTree, SessionFault> {
    let attributes = tree
        .get("module")
        .ok_or_else(|| SessionFault::new(format!("{}: device tree has no module node", module)))?;

    let serial_number = text_field(attributes, "serialNumber");
    let logical_name = text_field(attributes, "logicalName");
    let friendly_name = if logical_name.is_empty() {
        serial_number.clone()
    } else {
        logical_name
    };

    // Index 0 is the data logger by convention; keep it there even when the
    // device lists it elsewhere or not at all.
    let mut data_logger = FunctionReading::new(FunctionKind::DataLogger, "dataLogger", "");
    let mut functions = Vec::new();
    for (function_id, node) in tree.iter().filter(|(id, _)| id.as_str() != "module") {
        let kind = FunctionKind::from_type_name(&function_type_name(function_id));
        let logical = text_field(node, "logicalName");
        let name = if logical.is_empty() {
            function_id.clone()
        } else {
            logical
        };
        let reading = FunctionReading::new(kind, name, text_field(node, "advertisedValue"));
        if reading.kind == FunctionKind::DataLogger {
            data_logger = reading;
        } else {
            functions.push(reading);
        }
    }
    functions.insert(0, data_logger);

    let info = ModuleInfo {
        hardware_id: format!("{}.module", serial_number),
        serial_number,
        product_name: text_field(attributes, "productName"),
        friendly_name,
        usb_current_ma: number_field(attributes, "usbCurrent")?,
        luminosity_percent: number_field(attributes, "luminosity")?,
        function_count: functions.len(),
    };
    Ok(DeviceTree { info, functions })
}

#[async_trait]
impl DeviceSession for VirtualHubSession {
    fn transport(&self) -> &str {
        &self.base_url
    }

    async fn register_hub(&mut self) -> Result<(), RegistrationError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| RegistrationError::new(&self.base_url, e.to_string()))?;
        let hub_module = format!("{}/api/module.json", self.base_url);
        client
            .get(&hub_module)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RegistrationError::new(&self.base_url, e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn unregister_hub(&mut self) {
        self.client = None;
        self.devices.clear();
    }

    async fn enumerate_modules(&mut self) -> Result<Vec<ModuleId>, SessionFault> {
        let entries: Vec<WhitePageEntry> = self.get_json("/api/services/whitePages.json").await?;
        self.devices.clear();
        Ok(entries
            .into_iter()
            .map(|entry| ModuleId::new(entry.serial_number))
            .collect())
    }

    async fn module_info(&mut self, module: &ModuleId) -> Result<ModuleInfo, SessionFault> {
        Ok(self.device(module).await?.info.clone())
    }

    async fn function_reading(
        &mut self,
        module: &ModuleId,
        index: usize,
    ) -> Result<FunctionReading, SessionFault> {
        self.device(module)
            .await?
            .functions
            .get(index)
            .cloned()
            .ok_or_else(|| {
                SessionFault::new(format!("function index {} out of range on {}", index, module))
            })
    }
}
