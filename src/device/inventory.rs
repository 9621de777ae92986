//! One-shot listing of attached modules and all their functions.

use crate::device::data::{FunctionReading, ModuleInfo};
use crate::device::traits::{DeviceSession, SessionFault};
use serde::Serialize;
use std::fmt;

/// A module and every function it exposes, index 0 included.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInventory {
    pub info: ModuleInfo,
    pub functions: Vec<FunctionReading>,
}

/// Enumerate every module and read every function once.
pub async fn take_inventory<S: DeviceSession + ?Sized>(
    session: &mut S,
) -> Result<Vec<ModuleInventory>, SessionFault> {
    let mut inventory = Vec::new();
    for module in session.enumerate_modules().await? {
        let info = session.module_info(&module).await?;
        let mut functions = Vec::with_capacity(info.function_count);
        for index in 0..info.function_count {
            functions.push(session.function_reading(&module, index).await?);
        }
        inventory.push(ModuleInventory { info, functions });
    }
    Ok(inventory)
}

impl fmt::Display for ModuleInventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.info;
        writeln!(
            f,
            "module : {} is a {}",
            info.serial_number, info.product_name
        )?;
        writeln!(f, "            luminosity {}", info.luminosity_percent)?;
        writeln!(f, "            current {} mA", info.usb_current_ma)?;
        writeln!(f, "            hardware id {}", info.hardware_id)?;
        writeln!(f, "            friendly name {}", info.friendly_name)?;
        writeln!(
            f,
            "{}.{} has {} functions",
            info.serial_number, info.product_name, info.function_count
        )?;
        for (index, function) in self.functions.iter().enumerate() {
            writeln!(
                f,
                "  {} = {} ({}) is {}",
                index, function.kind, function.name, function.value
            )?;
        }
        Ok(())
    }
}
