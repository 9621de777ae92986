//! One collection pass: hardware readings in, gauge updates out.

use crate::device::{DeviceSession, ModuleId, SessionFault};
use crate::metrics::registry::{MetricsRegistry, PassCounter, SensorGauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Pause after each function read, paces traffic on the hardware bus.
pub const FUNCTION_PACING: Duration = Duration::from_secs(1);

/// Function index reserved for the data logger; never exported.
pub const DATA_LOGGER_INDEX: usize = 0;

/// Outcome of a completed pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassSummary {
    /// Modules enumerated
    pub modules: usize,
    /// Gauge samples written, module-level ones included
    pub samples: usize,
    /// Recognized functions whose value could not be read
    pub unreadable_functions: usize,
    /// Wall time of the pass
    pub duration: Duration,
}

/// Maps hardware readings onto the metrics registry.
///
/// The collector owns the hardware session and is the only writer of the
/// registry's values.
pub struct Collector<S> {
    session: S,
    registry: Arc<MetricsRegistry>,
}

impl<S: DeviceSession> Collector<S> {
    pub fn new(session: S, registry: Arc<MetricsRegistry>) -> Self {
        Self { session, registry }
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// The hardware session, for lifecycle calls made by the supervisor.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Run one pass over every attached module.
    ///
    /// Fails only with a [`SessionFault`]; the pass is then abandoned and
    /// `sensor_read_passes` is left untouched. The pass duration is observed
    /// in `request_processing_seconds` either way.
    pub async fn run_pass(&mut self, log_access: bool) -> Result<PassSummary, SessionFault> {
        let start = Instant::now();
        let outcome = self.collect(log_access).await;
        let elapsed = start.elapsed();
        self.registry.observe_duration(elapsed.as_secs_f64());

        let mut summary = outcome?;
        summary.duration = elapsed;
        self.registry.set_read_time(elapsed.as_secs_f64());
        self.registry.increment_counter(PassCounter::SensorReadPasses);
        debug!(
            "Pass complete: {} modules, {} samples in {:.3}s",
            summary.modules,
            summary.samples,
            elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    async fn collect(&mut self, log_access: bool) -> Result<PassSummary, SessionFault> {
        let modules = self.session.enumerate_modules().await?;
        let mut summary = PassSummary {
            modules: modules.len(),
            ..PassSummary::default()
        };

        for module in &modules {
            self.collect_module(module, log_access, &mut summary).await?;
        }
        Ok(summary)
    }

    async fn collect_module(
        &mut self,
        module: &ModuleId,
        log_access: bool,
        summary: &mut PassSummary,
    ) -> Result<(), SessionFault> {
        let info = self.session.module_info(module).await?;
        let label = info.friendly_name.as_str();
        if log_access {
            info!("Reading module {} ({})", label, info.serial_number);
        }

        self.registry.set_gauge(
            SensorGauge::UsbCurrent,
            &SensorGauge::UsbCurrent.hardware_id(label),
            info.usb_current_ma,
        );
        self.registry.set_gauge(
            SensorGauge::Luminosity,
            &SensorGauge::Luminosity.hardware_id(label),
            info.luminosity_percent,
        );
        summary.samples += 2;

        for index in (DATA_LOGGER_INDEX + 1)..info.function_count {
            let reading = self.session.function_reading(module, index).await?;
            if let Some(gauge) = SensorGauge::for_function(&reading.kind) {
                match reading.numeric_value() {
                    Some(value) => {
                        self.registry.set_gauge(gauge, &gauge.hardware_id(label), value);
                        summary.samples += 1;
                    }
                    None => {
                        warn!(
                            "Unreadable {} value {:?} on {} function {}",
                            reading.kind, reading.value, label, index
                        );
                        summary.unreadable_functions += 1;
                    }
                }
            }
            time::sleep(FUNCTION_PACING).await;
        }
        Ok(())
    }
}
