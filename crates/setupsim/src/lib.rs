//! setupsim - educational OS-installation simulator core.
//!
//! Everything here is an in-memory fiction: the "media", "firmware", "disk",
//! and "drivers" exist to teach the conceptual flow of installing a desktop
//! operating system and its common failure modes. The crate exposes an
//! event-driven state machine ([`sim::Simulation`]); rendering, window
//! management, and audio live in a separate presentation layer that feeds
//! events in and reads stage/state back out.

pub mod compat;
pub mod config;
pub mod drivers;
pub mod failure;
pub mod oobe;
pub mod pacing;
pub mod scheduler;
pub mod sim;
pub mod stage;
pub mod tipgen;
pub mod toast;
pub mod wizard;

pub use compat::{check_boot_compatibility, BootFailure};
pub use config::{BiosConfig, BootMode, MediaConfig, OsVersion, PartitionScheme};
pub use failure::{FailureDecision, FailureProfile, FailureProfiles};
pub use sim::{SimOptions, Simulation, SyntheticConfig};
pub use stage::{Action, Event, InstallPhase, Stage};
