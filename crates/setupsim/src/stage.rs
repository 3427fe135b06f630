//! Stage and event vocabulary for the installation state machine.

use serde::{Deserialize, Serialize};

use crate::config::{OsVersion, PartitionScheme};
use crate::scheduler::TimerToken;
use crate::wizard::InstallType;

/// One discrete phase of the simulated install/boot/setup/desktop lifecycle.
///
/// The transition rules over this enum live in the orchestrator; every stage
/// has a defined successor set, and `Desktop` is the only terminal stage under
/// normal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    MediaCreator,
    BiosPost,
    BiosSetup,
    /// Transient, render-free: evaluates boot compatibility and immediately
    /// moves on. Never observable as the current stage after a dispatch.
    BootCheck,
    BootPrompt,
    BootError,
    BootLogo,
    SetupLanguage,
    SetupInstallNow,
    SetupProductKey,
    SetupLicense,
    SetupInstallType,
    SetupPartition,
    SetupCopying,
    SetupRebootRequired,
    Rebooting,
    OobeRegion,
    OobeNetwork,
    OobeUpdateCheck,
    OobeAccount,
    OobeSecurityQuestions,
    OobePrivacy,
    GettingReady,
    DriverSetup,
    Desktop,
    Recovery,
}

impl Stage {
    pub const ALL: [Stage; 26] = [
        Stage::MediaCreator,
        Stage::BiosPost,
        Stage::BiosSetup,
        Stage::BootCheck,
        Stage::BootPrompt,
        Stage::BootError,
        Stage::BootLogo,
        Stage::SetupLanguage,
        Stage::SetupInstallNow,
        Stage::SetupProductKey,
        Stage::SetupLicense,
        Stage::SetupInstallType,
        Stage::SetupPartition,
        Stage::SetupCopying,
        Stage::SetupRebootRequired,
        Stage::Rebooting,
        Stage::OobeRegion,
        Stage::OobeNetwork,
        Stage::OobeUpdateCheck,
        Stage::OobeAccount,
        Stage::OobeSecurityQuestions,
        Stage::OobePrivacy,
        Stage::GettingReady,
        Stage::DriverSetup,
        Stage::Desktop,
        Stage::Recovery,
    ];

    /// Terminal under normal flow (the critical-fault path out of the desktop
    /// is a debug/toy affordance, not a normal transition).
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Desktop)
    }

    /// Stages belonging to the setup wizard chain
    pub fn is_setup_wizard(self) -> bool {
        matches!(
            self,
            Stage::SetupLanguage
                | Stage::SetupInstallNow
                | Stage::SetupProductKey
                | Stage::SetupLicense
                | Stage::SetupInstallType
                | Stage::SetupPartition
                | Stage::SetupCopying
                | Stage::SetupRebootRequired
        )
    }

    /// Stages belonging to the out-of-box experience chain
    pub fn is_oobe(self) -> bool {
        matches!(
            self,
            Stage::OobeRegion
                | Stage::OobeNetwork
                | Stage::OobeUpdateCheck
                | Stage::OobeAccount
                | Stage::OobeSecurityQuestions
                | Stage::OobePrivacy
        )
    }
}

/// Session progress marker that routes the boot logo's auto-advance: a fresh
/// machine boots into the setup wizard, a machine with copied files boots
/// into OOBE, a fully set-up machine boots to the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallPhase {
    Bare,
    FilesCopied,
    OobeComplete,
}

/// Named user action, interpreted against the current stage. Actions that do
/// not apply to the current stage are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    // Media creator
    SelectOsVersion(OsVersion),
    SelectPartitionScheme(PartitionScheme),
    SetMediaLabel(String),
    StartBurn,
    CloseMediaCreator,

    // BIOS
    EnterBiosSetup,
    ToggleBootMode,
    ToggleSecureBoot,
    ToggleUsbBoot,
    SwapBootDevices(usize, usize),
    SaveBiosAndExit,
    DiscardBiosAndExit,

    // Boot negotiation
    PressAnyKey,
    DismissBootError,

    // Setup wizard
    SelectLanguage(String),
    InstallNow,
    EnterProductKey(String),
    SkipProductKey,
    ToggleLicenseAccepted,
    SelectInstallType(InstallType),
    SelectPartition(usize),
    /// Generic "Next"/"Continue" whose gate depends on the current stage
    Continue,
    RestartNow,

    // OOBE
    SelectRegion(String),
    ConnectNetwork,
    ContinueLimitedSetup,
    RetryUpdateCheck,
    SetUsername(String),
    SetPassword(String),
    AnswerSecurityQuestion(usize, String),
    AcceptPrivacySettings,

    // Driver setup
    ScanDrivers,
    InstallDrivers,
    RetryFailedDriver,

    // Desktop / recovery
    TriggerCriticalFault,
    DismissRecovery,
}

/// An input event accepted by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A named user action from the presentation layer
    Action(Action),
    /// A scheduled delay elapsed. Stale tokens (canceled on stage exit or
    /// already fired) are ignored.
    TimerElapsed(TimerToken),
}
