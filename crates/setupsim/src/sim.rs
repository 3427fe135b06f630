//! Simulation orchestrator - owns the current stage, the configuration
//! model, and every per-stage session record, and drives the checker, the
//! failure engine, and the timer scheduler.
//!
//! The presentation layer talks to this through two calls: `dispatch` for
//! discrete input events and `advance` for elapsed time. Only one transition
//! is ever in flight; timers are torn down when their stage exits, so a stale
//! delay can never re-fire a transition for a stage the user already left.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::compat::{check_boot_compatibility, BootFailure};
use crate::config::{BiosConfig, MediaConfig};
use crate::drivers::{DriverPipeline, DriverStep};
use crate::failure::{FailureDecision, FailureProfiles};
use crate::oobe::{OobeState, UpdateCheckState};
use crate::pacing;
use crate::scheduler::Scheduler;
use crate::stage::{Action, Event, InstallPhase, Stage};
use crate::tipgen;
use crate::toast::ToastQueue;
use crate::wizard::{product_key_ok, InstallType, PartitionKind, WizardState};

/// Construction options for a simulation session
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Stage to start from; anything but the media creator synthesizes
    /// plausible defaults for the skipped stages
    pub initial_stage: Stage,
    /// RNG seed for reproducible failure draws; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Per-stage failure probabilities and retry bounds
    pub profiles: FailureProfiles,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            initial_stage: Stage::MediaCreator,
            seed: None,
            profiles: FailureProfiles::default(),
        }
    }
}

/// Optional overrides for the synthesized state of a stage jump
#[derive(Debug, Clone, Default)]
pub struct SyntheticConfig {
    pub media: Option<MediaConfig>,
    pub bios: Option<BiosConfig>,
}

/// Read-only view of the configuration model
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    pub media: Option<MediaConfig>,
    pub bios: BiosConfig,
}

/// Working state of the media-creator stage
#[derive(Debug, Clone)]
struct MediaSession {
    draft: MediaConfig,
    burn_progress: u8,
    burning: bool,
    complete: bool,
}

impl Default for MediaSession {
    fn default() -> Self {
        Self {
            draft: MediaConfig::draft(),
            burn_progress: 0,
            burning: false,
            complete: false,
        }
    }
}

/// One simulated installation session
pub struct Simulation {
    session_id: Uuid,
    stage: Stage,
    phase: InstallPhase,
    history: Vec<Stage>,

    media: Option<MediaConfig>,
    bios: BiosConfig,
    media_session: MediaSession,
    bios_draft: Option<BiosConfig>,
    boot_error: Option<BootFailure>,

    wizard: WizardState,
    oobe: OobeState,
    drivers: DriverPipeline,

    install_tips: Vec<String>,
    welcome_message: Option<String>,

    scheduler: Scheduler,
    toasts: ToastQueue,
    profiles: FailureProfiles,
    rng: StdRng,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    pub fn new() -> Self {
        Self::with_options(SimOptions::default())
    }

    pub fn with_options(options: SimOptions) -> Self {
        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sim = Self {
            session_id: Uuid::new_v4(),
            stage: Stage::MediaCreator,
            phase: InstallPhase::Bare,
            history: vec![Stage::MediaCreator],
            media: None,
            bios: BiosConfig::default(),
            media_session: MediaSession::default(),
            bios_draft: None,
            boot_error: None,
            wizard: WizardState::new(),
            oobe: OobeState::new(),
            drivers: DriverPipeline::new(),
            install_tips: tipgen::fallback_tips(),
            welcome_message: None,
            scheduler: Scheduler::new(),
            toasts: ToastQueue::new(),
            profiles: options.profiles,
            rng,
        };
        info!("simulation session {} starting", sim.session_id);

        if options.initial_stage != Stage::MediaCreator {
            sim.jump_to_stage(options.initial_stage, None);
        }
        sim
    }

    // === Input ===

    /// Process one input event. Stale timer tokens are ignored.
    pub fn dispatch(&mut self, event: Event) {
        match event {
            Event::Action(action) => self.handle_action(action),
            Event::TimerElapsed(token) => match self.scheduler.take(token) {
                Some(stage) if stage == self.stage => self.handle_timer(),
                Some(stage) => debug!("dropping timer for inactive stage {:?}", stage),
                None => debug!("ignoring stale timer token"),
            },
        }
    }

    /// Advance the logical clock, firing every due timer in order and
    /// expiring old toasts.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.scheduler.now() + dt;
        while let Some((_, stage)) = self.scheduler.fire_next(target) {
            if stage == self.stage {
                self.handle_timer();
            } else {
                debug!("dropping timer for inactive stage {:?}", stage);
            }
        }
        self.scheduler.settle(target);
        self.toasts.expire(self.scheduler.now());
    }

    /// Debug entry point: jump straight to `stage`, synthesizing plausible
    /// state for everything that was skipped so no downstream stage observes
    /// missing configuration.
    pub fn jump_to_stage(&mut self, stage: Stage, synthetic: Option<SyntheticConfig>) {
        let from = self.stage;
        self.exit_stage(from);

        if stage != Stage::MediaCreator && self.media.is_none() {
            self.media = Some(MediaConfig::synthesized());
        }
        self.phase = phase_for_stage(stage).unwrap_or(self.phase);
        match stage {
            Stage::BootError if self.boot_error.is_none() => {
                self.boot_error = Some(BootFailure::OsNotFound);
            }
            Stage::SetupCopying | Stage::SetupRebootRequired => {
                self.wizard.license_accepted = true;
                if self.wizard.install_type.is_none() {
                    self.wizard.install_type = Some(InstallType::Custom);
                }
                if self.wizard.selected_partition.is_none() {
                    self.wizard.selected_partition = self
                        .wizard
                        .partitions
                        .iter()
                        .position(|p| p.kind == PartitionKind::Primary);
                }
            }
            Stage::OobeSecurityQuestions => {
                self.oobe.password_set = true;
            }
            _ => {}
        }
        if matches!(
            stage,
            Stage::GettingReady | Stage::DriverSetup | Stage::Desktop | Stage::Recovery
        ) && self.oobe.username.trim().is_empty()
        {
            self.oobe.username = "User".to_string();
        }

        if let Some(synth) = synthetic {
            if let Some(media) = synth.media {
                self.media = Some(media);
            }
            if let Some(bios) = synth.bios {
                self.bios = bios;
            }
        }

        self.stage = stage;
        self.history.push(stage);
        info!("stage transition: {:?} -> {:?} (jump)", from, stage);
        self.enter_stage(stage);
    }

    // === Observation ===

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    pub fn install_phase(&self) -> InstallPhase {
        self.phase
    }

    /// Every stage entered so far, in order, transient stages included
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn media(&self) -> Option<&MediaConfig> {
        self.media.as_ref()
    }

    pub fn bios(&self) -> &BiosConfig {
        &self.bios
    }

    /// The BIOS setup stage's working copy, present only inside that stage
    pub fn bios_draft(&self) -> Option<&BiosConfig> {
        self.bios_draft.as_ref()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            media: self.media.clone(),
            bios: self.bios.clone(),
        }
    }

    pub fn boot_error(&self) -> Option<BootFailure> {
        self.boot_error
    }

    pub fn wizard(&self) -> &WizardState {
        &self.wizard
    }

    pub fn oobe(&self) -> &OobeState {
        &self.oobe
    }

    pub fn drivers(&self) -> &DriverPipeline {
        &self.drivers
    }

    pub fn burn_progress(&self) -> u8 {
        self.media_session.burn_progress
    }

    pub fn media_ready(&self) -> bool {
        self.media_session.complete
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    pub fn install_tips(&self) -> &[String] {
        &self.install_tips
    }

    // === Collaborator strings (cosmetic, host-provided) ===

    pub fn set_install_tips(&mut self, tips: Vec<String>) {
        if !tips.is_empty() {
            self.install_tips = tips;
        }
    }

    pub fn set_welcome_message(&mut self, message: String) {
        if !message.trim().is_empty() {
            self.welcome_message = Some(message);
        }
    }

    // === Transition machinery ===

    fn transition(&mut self, to: Stage) {
        let from = self.stage;
        self.exit_stage(from);
        self.stage = to;
        self.history.push(to);
        info!("stage transition: {:?} -> {:?}", from, to);
        self.enter_stage(to);
    }

    fn exit_stage(&mut self, stage: Stage) {
        self.scheduler.cancel_stage(stage);
        if stage == Stage::BiosSetup {
            self.bios_draft = None;
        }
    }

    fn enter_stage(&mut self, stage: Stage) {
        match stage {
            Stage::BiosPost => {
                self.scheduler.schedule(stage, pacing::post::AUTO_ADVANCE);
            }
            Stage::BiosSetup => {
                self.bios_draft = Some(self.bios.clone());
            }
            Stage::BootCheck => self.resolve_boot_check(),
            Stage::BootPrompt => {
                self.scheduler.schedule(stage, pacing::boot::PROMPT_WINDOW);
            }
            Stage::BootLogo => {
                self.scheduler.schedule(stage, pacing::boot::LOGO_HOLD);
            }
            Stage::SetupCopying => {
                self.wizard.copy_progress = 0;
                if self.wizard.copy_fault.is_none() {
                    self.wizard.copy_fault =
                        Some(FailureDecision::roll(self.profiles.file_copy, &mut self.rng));
                }
                self.scheduler.schedule(stage, pacing::wizard::COPY_TICK);
            }
            Stage::SetupRebootRequired => {
                self.scheduler.schedule(stage, pacing::wizard::RESTART_AUTO);
            }
            Stage::Rebooting => {
                self.scheduler.schedule(stage, pacing::wizard::REBOOT_HOLD);
            }
            Stage::OobeUpdateCheck => {
                if self.oobe.update_fault.is_none() {
                    self.oobe.update_fault = Some(FailureDecision::roll(
                        self.profiles.update_check,
                        &mut self.rng,
                    ));
                }
                self.oobe.update_state = UpdateCheckState::Checking;
                self.scheduler
                    .schedule(stage, pacing::oobe::UPDATE_CHECK_DELAY);
            }
            Stage::GettingReady => {
                self.phase = InstallPhase::OobeComplete;
                self.scheduler
                    .schedule(stage, pacing::oobe::GETTING_READY_HOLD);
            }
            Stage::DriverSetup => {
                if self.drivers.fault.is_none() {
                    self.drivers.fault = Some(FailureDecision::roll(
                        self.profiles.driver_install,
                        &mut self.rng,
                    ));
                }
            }
            Stage::Desktop => {
                let message = self
                    .welcome_message
                    .clone()
                    .unwrap_or_else(|| tipgen::fallback_welcome(&self.oobe.username));
                self.toast(message);
            }
            _ => {}
        }
    }

    /// Transient decision stage: evaluate compatibility and move on without
    /// ever being observable as the current stage.
    fn resolve_boot_check(&mut self) {
        match check_boot_compatibility(self.media.as_ref(), &self.bios) {
            Ok(()) => {
                self.boot_error = None;
                self.transition(Stage::BootPrompt);
            }
            Err(reason) => {
                info!("boot check failed: {}", reason);
                self.boot_error = Some(reason);
                self.transition(Stage::BootError);
            }
        }
    }

    // === Timer-driven behavior ===

    fn handle_timer(&mut self) {
        match self.stage {
            Stage::MediaCreator => self.burn_tick(),
            Stage::BiosPost => self.transition(Stage::BootCheck),
            Stage::BootPrompt => {
                // Timing failure, distinct from the configuration failures
                self.boot_error = Some(BootFailure::OsNotFound);
                info!("no key pressed at boot prompt");
                self.transition(Stage::BootError);
            }
            Stage::BootLogo => {
                let next = match self.phase {
                    InstallPhase::Bare => Stage::SetupLanguage,
                    InstallPhase::FilesCopied => Stage::OobeRegion,
                    InstallPhase::OobeComplete => Stage::Desktop,
                };
                self.transition(next);
            }
            Stage::SetupCopying => self.copy_tick(),
            Stage::SetupRebootRequired => self.transition(Stage::Rebooting),
            Stage::Rebooting => self.transition(Stage::BootLogo),
            Stage::OobeUpdateCheck => self.update_check_tick(),
            Stage::GettingReady => self.transition(Stage::DriverSetup),
            Stage::DriverSetup => self.driver_tick(),
            other => debug!("no timer behavior for {:?}", other),
        }
    }

    fn burn_tick(&mut self) {
        self.media_session.burn_progress =
            (self.media_session.burn_progress + pacing::media::BURN_STEP).min(100);
        if self.media_session.burn_progress >= 100 {
            self.media_session.burning = false;
            self.media_session.complete = true;
            let mut media = self.media_session.draft.clone();
            media.is_created = true;
            info!(
                "installation media created: '{}' ({}, {:?})",
                media.label,
                media.os_version.label(),
                media.partition_scheme
            );
            self.media = Some(media);
            self.toast("Installation media created successfully.");
        } else {
            self.scheduler
                .schedule(Stage::MediaCreator, pacing::media::BURN_TICK);
        }
    }

    fn copy_tick(&mut self) {
        self.wizard.copy_progress =
            (self.wizard.copy_progress + pacing::wizard::COPY_STEP).min(100);

        let past_threshold = self.wizard.copy_progress >= pacing::wizard::COPY_FAIL_THRESHOLD;
        let fails = past_threshold
            && self
                .wizard
                .copy_fault
                .as_ref()
                .map(|f| f.should_fail())
                .unwrap_or(false);

        if fails {
            if let Some(fault) = self.wizard.copy_fault.as_mut() {
                fault.record_attempt();
            }
            info!("file copy failed at {}%", self.wizard.copy_progress);
            self.toast(
                "Windows cannot install required files. The file may be corrupt \
                 or missing. Error code: 0x80070570",
            );
            // No automatic retry: back to the partition page to start over
            self.transition(Stage::SetupPartition);
        } else if self.wizard.copy_progress >= 100 {
            self.phase = InstallPhase::FilesCopied;
            self.transition(Stage::SetupRebootRequired);
        } else {
            self.scheduler
                .schedule(Stage::SetupCopying, pacing::wizard::COPY_TICK);
        }
    }

    fn update_check_tick(&mut self) {
        let fails = self
            .oobe
            .update_fault
            .as_ref()
            .map(|f| f.should_fail())
            .unwrap_or(false);

        if fails {
            if let Some(fault) = self.oobe.update_fault.as_mut() {
                fault.record_attempt();
            }
            self.oobe.update_state = UpdateCheckState::Failed;
            self.toast("We couldn't check for updates. Retry, or continue and update later.");
        } else {
            self.oobe.update_state = UpdateCheckState::Passed;
            self.transition(Stage::OobeAccount);
        }
    }

    fn driver_tick(&mut self) {
        if self.drivers.all_installed() {
            self.transition(Stage::Desktop);
            return;
        }
        match self.drivers.step() {
            DriverStep::DeviceInstalled { more } => {
                if more {
                    self.scheduler
                        .schedule(Stage::DriverSetup, pacing::drivers::INSTALL_TICK);
                } else if self.drivers.all_installed() {
                    self.toast("All devices are ready.");
                    self.scheduler
                        .schedule(Stage::DriverSetup, pacing::drivers::DESKTOP_HANDOFF);
                }
            }
            DriverStep::DeviceFailed { name } => {
                self.toast(format!("Driver installation failed for {}.", name));
            }
            DriverStep::Idle => debug!("driver tick with no active install"),
        }
    }

    // === Action-driven behavior ===

    fn handle_action(&mut self, action: Action) {
        match (self.stage, action) {
            // Media creator
            (Stage::MediaCreator, Action::SelectOsVersion(v)) => {
                if self.media_editable() {
                    self.media_session.draft.os_version = v;
                }
            }
            (Stage::MediaCreator, Action::SelectPartitionScheme(s)) => {
                if self.media_editable() {
                    self.media_session.draft.partition_scheme = s;
                }
            }
            (Stage::MediaCreator, Action::SetMediaLabel(label)) => {
                if self.media_editable() && !label.trim().is_empty() {
                    self.media_session.draft.label = label;
                }
            }
            (Stage::MediaCreator, Action::StartBurn) => {
                if self.media_editable() {
                    self.media_session.burning = true;
                    self.media_session.burn_progress = 0;
                    info!("media burn started");
                    self.scheduler
                        .schedule(Stage::MediaCreator, pacing::media::BURN_TICK);
                }
            }
            (Stage::MediaCreator, Action::CloseMediaCreator) => {
                if self.media_session.complete {
                    self.transition(Stage::BiosPost);
                } else {
                    debug!("close ignored: media not created yet");
                }
            }

            // BIOS POST
            (Stage::BiosPost, Action::EnterBiosSetup) => self.transition(Stage::BiosSetup),

            // BIOS setup (edits go to the draft; only save persists them)
            (Stage::BiosSetup, Action::ToggleBootMode) => {
                if let Some(draft) = self.bios_draft.as_mut() {
                    draft.toggle_boot_mode();
                }
            }
            (Stage::BiosSetup, Action::ToggleSecureBoot) => {
                if let Some(draft) = self.bios_draft.as_mut() {
                    draft.toggle_secure_boot();
                }
            }
            (Stage::BiosSetup, Action::ToggleUsbBoot) => {
                if let Some(draft) = self.bios_draft.as_mut() {
                    draft.toggle_usb_boot();
                }
            }
            (Stage::BiosSetup, Action::SwapBootDevices(a, b)) => {
                if let Some(draft) = self.bios_draft.as_mut() {
                    if !draft.swap_boot_devices(a, b) {
                        debug!("boot order swap rejected: {} <-> {}", a, b);
                    }
                }
            }
            (Stage::BiosSetup, Action::SaveBiosAndExit) => {
                if let Some(draft) = self.bios_draft.take() {
                    self.bios = draft;
                    info!("firmware settings saved");
                    self.toast("Firmware settings saved.");
                }
                self.transition(Stage::BootCheck);
            }
            (Stage::BiosSetup, Action::DiscardBiosAndExit) => {
                self.bios_draft = None;
                info!("firmware changes discarded");
                self.transition(Stage::BiosPost);
            }

            // Boot negotiation
            (Stage::BootPrompt, Action::PressAnyKey) => self.transition(Stage::BootLogo),
            (Stage::BootError, Action::DismissBootError | Action::PressAnyKey) => {
                self.boot_error = None;
                self.transition(Stage::BiosPost);
            }

            // Setup wizard
            (Stage::SetupLanguage, Action::SelectLanguage(language)) => {
                self.wizard.language = language;
            }
            (Stage::SetupLanguage, Action::Continue) => self.transition(Stage::SetupInstallNow),
            (Stage::SetupInstallNow, Action::InstallNow) => {
                self.transition(Stage::SetupProductKey)
            }
            (Stage::SetupProductKey, Action::EnterProductKey(key)) => {
                if product_key_ok(&key) {
                    self.wizard.product_key = Some(key);
                } else {
                    self.toast("That product key doesn't look right. Check it and try again.");
                }
            }
            (Stage::SetupProductKey, Action::SkipProductKey) => {
                self.wizard.key_skipped = true;
                self.transition(Stage::SetupLicense);
            }
            (Stage::SetupProductKey, Action::Continue) => {
                if self.wizard.key_satisfied() {
                    self.transition(Stage::SetupLicense);
                } else {
                    self.toast("Enter a product key, or choose \"I don't have a product key\".");
                }
            }
            (Stage::SetupLicense, Action::ToggleLicenseAccepted) => {
                self.wizard.license_accepted = !self.wizard.license_accepted;
            }
            (Stage::SetupLicense, Action::Continue) => {
                if self.wizard.license_accepted {
                    self.transition(Stage::SetupInstallType);
                } else {
                    self.toast("Accept the license terms to continue.");
                }
            }
            (Stage::SetupInstallType, Action::SelectInstallType(install_type)) => {
                self.wizard.install_type = Some(install_type);
                self.transition(Stage::SetupPartition);
            }
            (Stage::SetupPartition, Action::SelectPartition(index)) => {
                if !self.wizard.select_partition(index) {
                    debug!("partition selection out of range: {}", index);
                }
            }
            (Stage::SetupPartition, Action::Continue) => match self.wizard.validate_target() {
                Ok(()) => self.transition(Stage::SetupCopying),
                Err(message) => self.toast(message),
            },
            (Stage::SetupRebootRequired, Action::RestartNow) => self.transition(Stage::Rebooting),

            // OOBE
            (Stage::OobeRegion, Action::SelectRegion(region)) => self.oobe.region = region,
            (Stage::OobeRegion, Action::Continue) => self.transition(Stage::OobeNetwork),
            (Stage::OobeNetwork, Action::ConnectNetwork) => {
                self.oobe.limited_setup = false;
                self.transition(Stage::OobeUpdateCheck);
            }
            (Stage::OobeNetwork, Action::ContinueLimitedSetup) => {
                self.oobe.limited_setup = true;
                info!("limited setup chosen, skipping update check");
                self.transition(Stage::OobeAccount);
            }
            (Stage::OobeUpdateCheck, Action::RetryUpdateCheck) => {
                if self.oobe.update_state == UpdateCheckState::Failed {
                    self.oobe.update_state = UpdateCheckState::Checking;
                    self.scheduler
                        .schedule(Stage::OobeUpdateCheck, pacing::oobe::UPDATE_CHECK_DELAY);
                }
            }
            (Stage::OobeAccount, Action::SetUsername(name)) => self.oobe.username = name,
            (Stage::OobeAccount, Action::SetPassword(password)) => {
                self.oobe.set_password(&password);
            }
            (Stage::OobeAccount, Action::Continue) => {
                if !self.oobe.account_complete() {
                    self.toast("Choose a name for your account.");
                } else if self.oobe.wants_security_questions() {
                    self.transition(Stage::OobeSecurityQuestions);
                } else {
                    self.transition(Stage::OobePrivacy);
                }
            }
            (Stage::OobeSecurityQuestions, Action::AnswerSecurityQuestion(index, answer)) => {
                if !self.oobe.answer_security_question(index, &answer) {
                    debug!("security answer rejected for question {}", index);
                }
            }
            (Stage::OobeSecurityQuestions, Action::Continue) => {
                if self.oobe.answers_complete() {
                    self.transition(Stage::OobePrivacy);
                } else {
                    self.toast("Answer all three security questions to continue.");
                }
            }
            (Stage::OobePrivacy, Action::AcceptPrivacySettings) => {
                self.oobe.privacy_accepted = true;
                self.transition(Stage::GettingReady);
            }

            // Driver setup
            (Stage::DriverSetup, Action::ScanDrivers) => {
                self.drivers.scan();
                self.toast("Device scan complete.");
            }
            (Stage::DriverSetup, Action::InstallDrivers) => {
                if self.drivers.begin_install() {
                    self.scheduler
                        .schedule(Stage::DriverSetup, pacing::drivers::INSTALL_TICK);
                }
            }
            (Stage::DriverSetup, Action::RetryFailedDriver) => {
                if self.drivers.retry_failed() {
                    self.scheduler
                        .schedule(Stage::DriverSetup, pacing::drivers::INSTALL_TICK);
                }
            }

            // Desktop / recovery
            (Stage::Desktop, Action::TriggerCriticalFault) => {
                info!("critical system fault triggered");
                self.transition(Stage::Recovery);
            }
            (Stage::Recovery, Action::DismissRecovery | Action::PressAnyKey) => {
                self.transition(Stage::BiosPost);
            }

            (stage, action) => debug!("ignoring {:?} in stage {:?}", action, stage),
        }
    }

    fn media_editable(&self) -> bool {
        !self.media_session.burning && !self.media_session.complete
    }

    fn toast(&mut self, message: impl Into<String>) {
        let now = self.scheduler.now();
        self.toasts.push(now, message);
    }
}

/// Install phase a session must be in for `stage` to make sense; `None`
/// leaves the current phase untouched.
fn phase_for_stage(stage: Stage) -> Option<InstallPhase> {
    match stage {
        Stage::MediaCreator
        | Stage::BiosPost
        | Stage::BiosSetup
        | Stage::BootCheck
        | Stage::BootPrompt
        | Stage::BootError
        | Stage::BootLogo => Some(InstallPhase::Bare),
        // Reaching the reboot-required screen means the copy finished
        Stage::SetupRebootRequired => Some(InstallPhase::FilesCopied),
        s if s.is_setup_wizard() => Some(InstallPhase::Bare),
        Stage::Rebooting => Some(InstallPhase::FilesCopied),
        s if s.is_oobe() => Some(InstallPhase::FilesCopied),
        Stage::GettingReady | Stage::DriverSetup | Stage::Desktop | Stage::Recovery => {
            Some(InstallPhase::OobeComplete)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Simulation {
        Simulation::with_options(SimOptions {
            initial_stage: Stage::MediaCreator,
            seed: Some(11),
            profiles: FailureProfiles::never_fail(),
        })
    }

    #[test]
    fn boot_check_is_never_the_current_stage() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::BiosPost, None);
        sim.advance(pacing::post::AUTO_ADVANCE);
        assert_ne!(sim.current_stage(), Stage::BootCheck);
        assert!(sim.history().contains(&Stage::BootCheck));
    }

    #[test]
    fn actions_for_other_stages_are_ignored() {
        let mut sim = quiet();
        let before = sim.current_stage();
        sim.dispatch(Event::Action(Action::InstallDrivers));
        sim.dispatch(Event::Action(Action::AcceptPrivacySettings));
        assert_eq!(sim.current_stage(), before);
    }

    #[test]
    fn jump_to_desktop_synthesizes_created_media() {
        let mut sim = quiet();
        assert!(sim.media().is_none());
        sim.jump_to_stage(Stage::Desktop, None);
        let media = sim.media().expect("media must be synthesized");
        assert!(media.is_created);
        assert_eq!(sim.current_stage(), Stage::Desktop);
    }

    #[test]
    fn jump_to_boot_error_carries_a_reason() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::BootError, None);
        assert!(sim.boot_error().is_some());
    }

    #[test]
    fn jump_past_the_partition_page_selects_a_valid_target() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::SetupCopying, None);
        assert!(sim.wizard().license_accepted);
        assert!(sim.wizard().validate_target().is_ok());
    }

    #[test]
    fn jump_to_reboot_required_lands_past_the_copy() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::SetupRebootRequired, None);
        assert_eq!(sim.install_phase(), InstallPhase::FilesCopied);
    }

    #[test]
    fn jump_accepts_synthetic_overrides() {
        use crate::config::{BootMode, PartitionScheme};

        let mut sim = quiet();
        let synthetic = SyntheticConfig {
            media: Some(MediaConfig {
                partition_scheme: PartitionScheme::Mbr,
                ..MediaConfig::synthesized()
            }),
            bios: Some(BiosConfig {
                boot_mode: BootMode::Legacy,
                secure_boot: false,
                ..BiosConfig::default()
            }),
        };
        sim.jump_to_stage(Stage::BiosPost, Some(synthetic));
        assert_eq!(
            sim.media().unwrap().partition_scheme,
            PartitionScheme::Mbr
        );
        assert_eq!(sim.bios().boot_mode, BootMode::Legacy);
    }

    #[test]
    fn discard_exits_without_persisting_bios_edits() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::BiosPost, None);
        sim.dispatch(Event::Action(Action::EnterBiosSetup));
        sim.dispatch(Event::Action(Action::ToggleSecureBoot));
        sim.dispatch(Event::Action(Action::DiscardBiosAndExit));

        assert_eq!(sim.current_stage(), Stage::BiosPost);
        assert!(sim.bios().secure_boot, "discard must not persist the draft");
        assert!(sim.bios_draft().is_none());
    }

    #[test]
    fn save_persists_bios_edits_and_boots() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::BiosPost, None);
        sim.dispatch(Event::Action(Action::EnterBiosSetup));
        sim.dispatch(Event::Action(Action::ToggleSecureBoot));
        sim.dispatch(Event::Action(Action::SaveBiosAndExit));

        assert!(!sim.bios().secure_boot);
        // Compatible GPT+UEFI media: the check lands on the boot prompt
        assert_eq!(sim.current_stage(), Stage::BootPrompt);
    }

    #[test]
    fn welcome_message_override_reaches_the_desktop_toast() {
        let mut sim = quiet();
        sim.set_welcome_message("Welcome back, Ada!".to_string());
        sim.jump_to_stage(Stage::Desktop, None);
        assert!(sim
            .toasts()
            .messages()
            .iter()
            .any(|m| m.contains("Welcome back, Ada!")));
    }

    #[test]
    fn toasts_expire_as_time_advances() {
        let mut sim = quiet();
        sim.jump_to_stage(Stage::Desktop, None);
        assert!(!sim.toasts().is_empty());
        sim.advance(Duration::from_secs(30));
        assert!(sim.toasts().is_empty());
    }

    #[test]
    fn empty_tip_override_is_rejected() {
        let mut sim = quiet();
        let defaults = sim.install_tips().to_vec();
        sim.set_install_tips(Vec::new());
        assert_eq!(sim.install_tips(), defaults.as_slice());
    }
}
