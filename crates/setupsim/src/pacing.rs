//! Pacing constants - every auto-advance delay, tick interval, and threshold.
//!
//! Stage logic never hard-codes a duration inline; it reads from here so the
//! simulated timings stay reviewable in one place.

/// BIOS POST screen pacing
pub mod post {
    use std::time::Duration;

    /// How long POST waits for a setup keypress before booting on its own
    pub const AUTO_ADVANCE: Duration = Duration::from_millis(2500);
}

/// Boot negotiation pacing
pub mod boot {
    use std::time::Duration;

    /// "Press any key to boot..." input window
    pub const PROMPT_WINDOW: Duration = Duration::from_millis(3000);

    /// Spinner-and-logo hold before the next phase loads
    pub const LOGO_HOLD: Duration = Duration::from_millis(4000);
}

/// Installation-media burn pacing
pub mod media {
    use std::time::Duration;

    /// Interval between burn progress updates
    pub const BURN_TICK: Duration = Duration::from_millis(300);

    /// Burn progress gained per tick (percent)
    pub const BURN_STEP: u8 = 10;
}

/// Setup-wizard pacing
pub mod wizard {
    use std::time::Duration;

    /// Interval between file-copy progress updates
    pub const COPY_TICK: Duration = Duration::from_millis(400);

    /// Copy progress gained per tick (percent)
    pub const COPY_STEP: u8 = 5;

    /// Progress mark at which a corrupt-file fault, if drawn, fires
    pub const COPY_FAIL_THRESHOLD: u8 = 55;

    /// Grace period on the reboot-required screen before auto-restart
    pub const RESTART_AUTO: Duration = Duration::from_millis(10_000);

    /// Simulated firmware handoff while "Rebooting..."
    pub const REBOOT_HOLD: Duration = Duration::from_millis(2500);
}

/// Out-of-box-experience pacing
pub mod oobe {
    use std::time::Duration;

    /// Simulated update-check round trip
    pub const UPDATE_CHECK_DELAY: Duration = Duration::from_millis(3000);

    /// "Getting things ready for you" hold before driver setup
    pub const GETTING_READY_HOLD: Duration = Duration::from_millis(15_000);
}

/// Driver-setup pacing
pub mod drivers {
    use std::time::Duration;

    /// Per-device install time
    pub const INSTALL_TICK: Duration = Duration::from_millis(1200);

    /// Pause after the last device installs before the desktop loads
    pub const DESKTOP_HANDOFF: Duration = Duration::from_millis(1500);
}

/// Notification pacing
pub mod toast {
    use std::time::Duration;

    /// How long a toast stays visible
    pub const TTL: Duration = Duration::from_millis(4000);
}
