//! Metric catalog and the collection pass that feeds it.
//!
//! The [`MetricsRegistry`] is the only state shared between the collection
//! loop and the scrape server. The [`Collector`] is its single writer.

pub mod collector;
pub mod registry;

// Re-export commonly used items
pub use collector::{Collector, PassSummary, FUNCTION_PACING};
pub use registry::{MetricsRegistry, PassCounter, SensorGauge};
