//! Driver-setup pipeline: a fixed simulated device set installed
//! sequentially, with one failure-prone device.
//!
//! A failure halts the batch (later devices stay detected); retrying resumes
//! the remaining batch from the failed device. The failure decision is drawn
//! once per session, so a user retry always clears the fault.

use serde::Serialize;
use tracing::debug;

use crate::failure::FailureDecision;

/// Install status of one simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DriverStatus {
    Pending,
    Detected,
    Installing,
    Installed,
    Error,
}

/// One simulated hardware device
#[derive(Debug, Clone, Serialize)]
pub struct DriverDevice {
    pub name: String,
    /// The one device whose install is subject to the failure engine
    pub flaky: bool,
    pub status: DriverStatus,
}

fn device(name: &str, flaky: bool) -> DriverDevice {
    DriverDevice {
        name: name.to_string(),
        flaky,
        status: DriverStatus::Pending,
    }
}

/// The fixed device fiction every session detects
pub fn default_device_set() -> Vec<DriverDevice> {
    vec![
        device("SVGA-3000 Display Adapter", false),
        device("RTL-8139 Ethernet Adapter", false),
        device("SoundWave HD Audio Controller", true),
        device("PCI Express Root Chipset", false),
    ]
}

/// Outcome of one install tick
#[derive(Debug, Clone, PartialEq)]
pub enum DriverStep {
    /// The active device installed; another one started installing
    DeviceInstalled { more: bool },
    /// The flaky device failed; the batch is halted until a retry
    DeviceFailed { name: String },
    /// Nothing was installing
    Idle,
}

/// Sequential driver-install pipeline, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct DriverPipeline {
    pub devices: Vec<DriverDevice>,
    pub scanned: bool,
    /// Session-wide install fault for the flaky device: one draw, kept until
    /// the desktop handoff
    pub fault: Option<FailureDecision>,
    active: Option<usize>,
}

impl Default for DriverPipeline {
    fn default() -> Self {
        Self {
            devices: default_device_set(),
            scanned: false,
            fault: None,
            active: None,
        }
    }
}

impl DriverPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardware scan: every pending device becomes detected
    pub fn scan(&mut self) {
        for dev in &mut self.devices {
            if dev.status == DriverStatus::Pending {
                dev.status = DriverStatus::Detected;
            }
        }
        self.scanned = true;
    }

    /// Start the sequential install. Returns false when there is nothing to
    /// install (not scanned yet, already running, or already complete).
    pub fn begin_install(&mut self) -> bool {
        if !self.scanned || self.active.is_some() {
            return false;
        }
        self.start_next()
    }

    /// Move the next detected device into `Installing`
    fn start_next(&mut self) -> bool {
        let next = self
            .devices
            .iter()
            .position(|d| d.status == DriverStatus::Detected);
        match next {
            Some(idx) => {
                self.devices[idx].status = DriverStatus::Installing;
                self.active = Some(idx);
                debug!("installing driver for '{}'", self.devices[idx].name);
                true
            }
            None => {
                self.active = None;
                false
            }
        }
    }

    /// Complete the active device's install attempt. The flaky device
    /// consults the session fault; everything else always succeeds.
    pub fn step(&mut self) -> DriverStep {
        let Some(idx) = self.active else {
            return DriverStep::Idle;
        };

        let flaky = self.devices[idx].flaky;
        let fails = flaky
            && self
                .fault
                .as_ref()
                .map(|f| f.should_fail())
                .unwrap_or(false);

        if fails {
            if let Some(fault) = self.fault.as_mut() {
                fault.record_attempt();
            }
            self.devices[idx].status = DriverStatus::Error;
            self.active = None;
            return DriverStep::DeviceFailed {
                name: self.devices[idx].name.clone(),
            };
        }

        self.devices[idx].status = DriverStatus::Installed;
        let more = self.start_next();
        DriverStep::DeviceInstalled { more }
    }

    /// Resume after a failure: the errored device re-enters the queue and the
    /// remaining batch continues from it.
    pub fn retry_failed(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        let failed = self
            .devices
            .iter()
            .position(|d| d.status == DriverStatus::Error);
        match failed {
            Some(idx) => {
                self.devices[idx].status = DriverStatus::Installing;
                self.active = Some(idx);
                true
            }
            None => false,
        }
    }

    pub fn installing(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.devices.iter().any(|d| d.status == DriverStatus::Error)
    }

    /// The stage's auto-advance gate: every device installed, nothing pending
    pub fn all_installed(&self) -> bool {
        self.devices
            .iter()
            .all(|d| d.status == DriverStatus::Installed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::{FailureDecision, FailureProfile};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fault(probability: f64) -> FailureDecision {
        let profile = FailureProfile {
            probability,
            max_attempts: 1,
        };
        FailureDecision::roll(profile, &mut StdRng::seed_from_u64(1))
    }

    fn run_to_completion_or_halt(pipeline: &mut DriverPipeline) -> Vec<DriverStep> {
        let mut steps = Vec::new();
        while pipeline.installing() {
            steps.push(pipeline.step());
        }
        steps
    }

    #[test]
    fn clean_batch_installs_every_device_in_order() {
        let mut pipeline = DriverPipeline::new();
        pipeline.fault = Some(fault(0.0));
        pipeline.scan();
        assert!(pipeline.begin_install());

        run_to_completion_or_halt(&mut pipeline);
        assert!(pipeline.all_installed());
        assert!(!pipeline.has_error());
    }

    #[test]
    fn flaky_device_halts_the_batch() {
        let mut pipeline = DriverPipeline::new();
        pipeline.fault = Some(fault(1.0));
        pipeline.scan();
        assert!(pipeline.begin_install());

        let steps = run_to_completion_or_halt(&mut pipeline);
        assert!(matches!(
            steps.last(),
            Some(DriverStep::DeviceFailed { name }) if name.contains("SoundWave")
        ));
        assert!(pipeline.has_error());
        assert!(!pipeline.all_installed());

        // Devices after the failed one were never attempted
        let chipset = pipeline
            .devices
            .iter()
            .find(|d| d.name.contains("Chipset"))
            .unwrap();
        assert_eq!(chipset.status, DriverStatus::Detected);
    }

    #[test]
    fn retry_resumes_and_completes_the_batch() {
        let mut pipeline = DriverPipeline::new();
        pipeline.fault = Some(fault(1.0));
        pipeline.scan();
        pipeline.begin_install();
        run_to_completion_or_halt(&mut pipeline);
        assert!(pipeline.has_error());

        // One draw per session: the retry is past the attempt bound
        assert!(pipeline.retry_failed());
        run_to_completion_or_halt(&mut pipeline);
        assert!(pipeline.all_installed());
        assert!(!pipeline.has_error());
    }

    #[test]
    fn install_requires_a_scan_first() {
        let mut pipeline = DriverPipeline::new();
        pipeline.fault = Some(fault(0.0));
        assert!(!pipeline.begin_install());
        pipeline.scan();
        assert!(pipeline.begin_install());
    }

    #[test]
    fn retry_without_error_is_rejected() {
        let mut pipeline = DriverPipeline::new();
        pipeline.fault = Some(fault(0.0));
        pipeline.scan();
        assert!(!pipeline.retry_failed());
    }
}
