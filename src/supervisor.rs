//! Periodic collection with recovery from hardware session faults.
//!
//! The supervisor runs passes strictly one after another with a fixed pause in
//! between. A [`SessionFault`] is counted in `yapi_exceptions` and triggers the
//! reset protocol: settle, unregister, settle, re-register, settle. Session
//! faults are retried forever; a failed re-registration is returned to the
//! caller, which must terminate the process.

use crate::device::{DeviceSession, RegistrationError, SessionFault};
use crate::metrics::{Collector, PassCounter, PassSummary};
use std::convert::Infallible;
use std::time::Duration;
use tokio::time;
use tracing::{debug, info, warn};

/// Pause before each steady-state pass.
pub const INTER_PASS_DELAY: Duration = Duration::from_secs(5);

/// Settle time around each step of the reset protocol.
pub const RESET_SETTLE: Duration = Duration::from_secs(5);

/// Pause after the first registration so attached devices finish arriving.
pub const HUB_SETTLE: Duration = Duration::from_secs(2);

/// Recovery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Steady periodic collection
    Running,
    /// A session fault was just caught
    FaultDetected,
    /// Tearing down and re-acquiring the session
    Resetting,
}

/// Drives a [`Collector`] and recovers its hardware session.
pub struct Supervisor<S> {
    collector: Collector<S>,
    log_access: bool,
    state: SupervisorState,
}

impl<S: DeviceSession> Supervisor<S> {
    pub fn new(collector: Collector<S>, log_access: bool) -> Self {
        Self {
            collector,
            log_access,
            state: SupervisorState::Running,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn collector(&self) -> &Collector<S> {
        &self.collector
    }

    /// Run the periodic loop. Returns only when re-registration fails.
    ///
    /// The caller is expected to have run a warm-up [`step`](Self::step) so
    /// the registry is populated before scrapes are served.
    pub async fn run(&mut self) -> Result<Infallible, RegistrationError> {
        loop {
            time::sleep(INTER_PASS_DELAY).await;
            self.step().await?;
        }
    }

    /// Run one pass; on a session fault, recover before returning.
    ///
    /// Returns `Ok(None)` for a pass that faulted and was recovered from.
    pub async fn step(&mut self) -> Result<Option<PassSummary>, RegistrationError> {
        match self.collector.run_pass(self.log_access).await {
            Ok(summary) => Ok(Some(summary)),
            Err(fault) => {
                self.fault_detected(&fault);
                self.reset().await?;
                Ok(None)
            }
        }
    }

    fn fault_detected(&mut self, fault: &SessionFault) {
        self.transition(SupervisorState::FaultDetected);
        self.collector
            .registry()
            .increment_counter(PassCounter::YapiExceptions);
        warn!("caught hardware session fault: {}", fault);
    }

    /// Tear the session down and acquire it again.
    pub async fn reset(&mut self) -> Result<(), RegistrationError> {
        self.transition(SupervisorState::Resetting);
        let session = self.collector.session_mut();
        info!("Resetting hardware session on {}", session.transport());

        time::sleep(RESET_SETTLE).await;
        session.unregister_hub().await;
        time::sleep(RESET_SETTLE).await;
        session.register_hub().await?;
        time::sleep(RESET_SETTLE).await;

        info!("back to normal operation");
        self.transition(SupervisorState::Running);
        Ok(())
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!("supervisor {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
