//! Prometheus metrics registry for the exporter.
//!
//! The catalog is fixed at construction: one gauge per sensor kind labeled by
//! `hardware_id` and `unit`, plus pass bookkeeping. All metrics are atomics, so
//! the scrape server reads them while the collector writes without either
//! side blocking the other. Each gauge updates independently.

use crate::device::FunctionKind;
use crate::error::Result;
use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

/// Sensor gauges exposed per module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorGauge {
    UsbCurrent,
    Luminosity,
    Pressure,
    Temperature,
    Humidity,
    Light,
    Co2,
}

impl SensorGauge {
    pub const ALL: [SensorGauge; 7] = [
        SensorGauge::UsbCurrent,
        SensorGauge::Luminosity,
        SensorGauge::Pressure,
        SensorGauge::Temperature,
        SensorGauge::Humidity,
        SensorGauge::Light,
        SensorGauge::Co2,
    ];

    /// Metric name.
    pub fn name(self) -> &'static str {
        match self {
            Self::UsbCurrent => "usb_current",
            Self::Luminosity => "luminosity",
            Self::Pressure => "pressure",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Light => "light",
            Self::Co2 => "co2",
        }
    }

    fn help(self) -> &'static str {
        match self {
            Self::UsbCurrent => "module USB current",
            Self::Luminosity => "module beacon luminosity",
            Self::Pressure => "air pressure",
            Self::Temperature => "air temperature",
            Self::Humidity => "air humidity",
            Self::Light => "light",
            Self::Co2 => "carbon dioxide concentration",
        }
    }

    /// Value of the fixed `unit` label.
    pub fn unit(self) -> &'static str {
        match self {
            Self::UsbCurrent => "mA",
            Self::Luminosity => "%",
            Self::Pressure => "mbar",
            Self::Temperature => "Celsius",
            Self::Humidity => "% RH",
            Self::Light => "lux",
            Self::Co2 => "ppm",
        }
    }

    /// Suffix appended to the module label to form `hardware_id`.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::UsbCurrent => "current",
            other => other.name(),
        }
    }

    /// `hardware_id` label value for a module.
    pub fn hardware_id(self, module_label: &str) -> String {
        format!("{}.{}", module_label, self.suffix())
    }

    /// Gauge fed by a function type, if the type is one we export.
    pub fn for_function(kind: &FunctionKind) -> Option<Self> {
        match kind {
            FunctionKind::Temperature => Some(Self::Temperature),
            FunctionKind::Pressure => Some(Self::Pressure),
            FunctionKind::Humidity => Some(Self::Humidity),
            FunctionKind::LightSensor => Some(Self::Light),
            FunctionKind::CarbonDioxide => Some(Self::Co2),
            FunctionKind::DataLogger | FunctionKind::Other(_) => None,
        }
    }
}

/// Bookkeeping counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCounter {
    /// `sensor_read_passes`: completed passes
    SensorReadPasses,
    /// `yapi_exceptions`: caught session faults
    YapiExceptions,
}

/// One labeled gauge family per [`SensorGauge`].
struct SensorGauges {
    usb_current: GaugeVec,
    luminosity: GaugeVec,
    pressure: GaugeVec,
    temperature: GaugeVec,
    humidity: GaugeVec,
    light: GaugeVec,
    co2: GaugeVec,
}

impl SensorGauges {
    fn register(registry: &Registry) -> Result<Self> {
        let family = |gauge: SensorGauge| -> Result<GaugeVec> {
            let vec = GaugeVec::new(
                Opts::new(gauge.name(), gauge.help()),
                &["hardware_id", "unit"],
            )?;
            registry.register(Box::new(vec.clone()))?;
            Ok(vec)
        };

        Ok(Self {
            usb_current: family(SensorGauge::UsbCurrent)?,
            luminosity: family(SensorGauge::Luminosity)?,
            pressure: family(SensorGauge::Pressure)?,
            temperature: family(SensorGauge::Temperature)?,
            humidity: family(SensorGauge::Humidity)?,
            light: family(SensorGauge::Light)?,
            co2: family(SensorGauge::Co2)?,
        })
    }

    fn get(&self, gauge: SensorGauge) -> &GaugeVec {
        match gauge {
            SensorGauge::UsbCurrent => &self.usb_current,
            SensorGauge::Luminosity => &self.luminosity,
            SensorGauge::Pressure => &self.pressure,
            SensorGauge::Temperature => &self.temperature,
            SensorGauge::Humidity => &self.humidity,
            SensorGauge::Light => &self.light,
            SensorGauge::Co2 => &self.co2,
        }
    }
}

/// Central metrics registry holding the exporter catalog.
pub struct MetricsRegistry {
    registry: Registry,
    sensor_gauges: SensorGauges,
    sensor_read_time: GaugeVec,
    sensor_read_passes: IntCounter,
    yapi_exceptions: IntCounter,
    request_processing_seconds: Histogram,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with the full catalog registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let sensor_gauges = SensorGauges::register(&registry)?;

        let sensor_read_time = GaugeVec::new(
            Opts::new("sensor_read_time", "time spend reading sensors/pass"),
            &["unit"],
        )?;
        registry.register(Box::new(sensor_read_time.clone()))?;

        let sensor_read_passes =
            IntCounter::new("sensor_read_passes", "number of sensor read passes")?;
        registry.register(Box::new(sensor_read_passes.clone()))?;

        let yapi_exceptions = IntCounter::new("yapi_exceptions", "number exceptions from YAPI")?;
        registry.register(Box::new(yapi_exceptions.clone()))?;

        let request_processing_seconds = Histogram::with_opts(HistogramOpts::new(
            "request_processing_seconds",
            "Time spent processing request",
        ))?;
        registry.register(Box::new(request_processing_seconds.clone()))?;

        Ok(Self {
            registry,
            sensor_gauges,
            sensor_read_time,
            sensor_read_passes,
            yapi_exceptions,
            request_processing_seconds,
        })
    }

    // ========================================================================
    // Recording helpers
    // ========================================================================

    /// Set a sensor gauge. Last write wins per `hardware_id`.
    pub fn set_gauge(&self, gauge: SensorGauge, hardware_id: &str, value: f64) {
        self.sensor_gauges
            .get(gauge)
            .with_label_values(&[hardware_id, gauge.unit()])
            .set(value);
    }

    /// Set `sensor_read_time{unit="s"}`.
    pub fn set_read_time(&self, seconds: f64) {
        self.sensor_read_time.with_label_values(&["s"]).set(seconds);
    }

    pub fn increment_counter(&self, counter: PassCounter) {
        match counter {
            PassCounter::SensorReadPasses => self.sensor_read_passes.inc(),
            PassCounter::YapiExceptions => self.yapi_exceptions.inc(),
        }
    }

    /// Observe one pass duration in `request_processing_seconds`.
    pub fn observe_duration(&self, seconds: f64) {
        self.request_processing_seconds.observe(seconds);
    }

    // ========================================================================
    // Reading
    // ========================================================================

    pub fn passes(&self) -> u64 {
        self.sensor_read_passes.get()
    }

    pub fn faults(&self) -> u64 {
        self.yapi_exceptions.get()
    }

    /// Number of pass durations observed.
    pub fn processing_observations(&self) -> u64 {
        self.request_processing_seconds.get_sample_count()
    }

    /// Current value of a sensor gauge, if it has ever been set.
    pub fn gauge_value(&self, gauge: SensorGauge, hardware_id: &str) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == gauge.name())
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|l| l.get_name() == "hardware_id" && l.get_value() == hardware_id)
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    /// Current value of `sensor_read_time`, if a pass has completed.
    pub fn read_time(&self) -> Option<f64> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_name() == "sensor_read_time")
            .flat_map(|family| family.get_metric())
            .map(|metric| metric.get_gauge().get_value())
            .next()
    }

    /// Every `hardware_id` label value currently exposed.
    pub fn hardware_ids(&self) -> Vec<String> {
        self.registry
            .gather()
            .iter()
            .flat_map(|family| family.get_metric())
            .flat_map(|metric| metric.get_label())
            .filter(|label| label.get_name() == "hardware_id")
            .map(|label| label.get_value().to_string())
            .collect()
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encode all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
