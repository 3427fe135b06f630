//! Boot compatibility checker - pure verdict on whether the configured media
//! can boot under the configured firmware settings.
//!
//! Rule order is a design decision, not incidental: the first applicable rule
//! wins, so a config that trips several rules always reports the same reason.

use tracing::debug;

use crate::config::{BiosConfig, BootMode, MediaConfig, PartitionScheme};

/// Why a simulated boot did not reach the OS loader.
///
/// The compatibility variants come from [`check_boot_compatibility`];
/// `OsNotFound` is a timing failure raised by the boot-prompt timeout and is
/// never returned by the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootFailure {
    #[error("No bootable media found. Create installation media and try again.")]
    NoBootableMedia,

    #[error("USB boot is disabled in the firmware settings.")]
    UsbBootDisabled,

    #[error("The installation media uses a GPT partition table, which requires UEFI boot mode.")]
    GptRequiresUefi,

    #[error("The installation media uses an MBR partition table, which requires Legacy boot mode.")]
    MbrRequiresLegacy,

    #[error("Secure Boot requires UEFI boot mode. Disable Secure Boot or switch to UEFI.")]
    SecureBootRequiresUefi,

    #[error("Operating System not found. Press any key to restart.")]
    OsNotFound,
}

/// Evaluate whether the media boots under the given firmware settings.
///
/// First applicable rule wins:
/// 1. absent or uncreated media
/// 2. USB boot disabled
/// 3. GPT media under Legacy boot
/// 4. MBR media under UEFI boot (CSM compatibility mode is deliberately not
///    modeled)
/// 5. Secure Boot enabled under Legacy boot
pub fn check_boot_compatibility(
    media: Option<&MediaConfig>,
    bios: &BiosConfig,
) -> Result<(), BootFailure> {
    let order = bios.effective_boot_order();
    debug!("boot check: attempting first boot device '{}'", order[0]);

    let media = match media {
        Some(m) if m.is_created => m,
        _ => return Err(BootFailure::NoBootableMedia),
    };

    if !bios.usb_boot_enabled {
        return Err(BootFailure::UsbBootDisabled);
    }

    match (media.partition_scheme, bios.boot_mode) {
        (PartitionScheme::Gpt, BootMode::Legacy) => return Err(BootFailure::GptRequiresUefi),
        (PartitionScheme::Mbr, BootMode::Uefi) => return Err(BootFailure::MbrRequiresLegacy),
        _ => {}
    }

    if bios.boot_mode == BootMode::Legacy && bios.secure_boot {
        return Err(BootFailure::SecureBootRequiresUefi);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(scheme: PartitionScheme, created: bool) -> MediaConfig {
        MediaConfig {
            partition_scheme: scheme,
            is_created: created,
            ..MediaConfig::draft()
        }
    }

    fn bios(mode: BootMode, secure_boot: bool, usb_boot_enabled: bool) -> BiosConfig {
        BiosConfig {
            boot_mode: mode,
            secure_boot,
            usb_boot_enabled,
            ..BiosConfig::default()
        }
    }

    /// Reference verdict computed independently from the rule table, used to
    /// pin the first-match order across the whole input space.
    fn expected(
        scheme: PartitionScheme,
        mode: BootMode,
        secure_boot: bool,
        usb: bool,
    ) -> Result<(), BootFailure> {
        if !usb {
            return Err(BootFailure::UsbBootDisabled);
        }
        if scheme == PartitionScheme::Gpt && mode == BootMode::Legacy {
            return Err(BootFailure::GptRequiresUefi);
        }
        if scheme == PartitionScheme::Mbr && mode == BootMode::Uefi {
            return Err(BootFailure::MbrRequiresLegacy);
        }
        if mode == BootMode::Legacy && secure_boot {
            return Err(BootFailure::SecureBootRequiresUefi);
        }
        Ok(())
    }

    #[test]
    fn exhaustive_over_created_media() {
        for scheme in [PartitionScheme::Gpt, PartitionScheme::Mbr] {
            for mode in [BootMode::Uefi, BootMode::Legacy] {
                for secure in [true, false] {
                    for usb in [true, false] {
                        let m = media(scheme, true);
                        let b = bios(mode, secure, usb);
                        let got = check_boot_compatibility(Some(&m), &b);
                        assert_eq!(
                            got,
                            expected(scheme, mode, secure, usb),
                            "scheme={:?} mode={:?} secure={} usb={}",
                            scheme,
                            mode,
                            secure,
                            usb
                        );
                        // Deterministic on repeated calls
                        assert_eq!(got, check_boot_compatibility(Some(&m), &b));
                    }
                }
            }
        }
    }

    #[test]
    fn missing_or_uncreated_media_always_wins() {
        for mode in [BootMode::Uefi, BootMode::Legacy] {
            for secure in [true, false] {
                for usb in [true, false] {
                    let b = bios(mode, secure, usb);
                    assert_eq!(
                        check_boot_compatibility(None, &b),
                        Err(BootFailure::NoBootableMedia)
                    );
                    let uncreated = media(PartitionScheme::Gpt, false);
                    assert_eq!(
                        check_boot_compatibility(Some(&uncreated), &b),
                        Err(BootFailure::NoBootableMedia)
                    );
                }
            }
        }
    }

    #[test]
    fn gpt_legacy_reports_before_secure_boot() {
        // Rule 3 fires even though rule 5's condition also holds
        let m = media(PartitionScheme::Gpt, true);
        let b = bios(BootMode::Legacy, true, true);
        assert_eq!(
            check_boot_compatibility(Some(&m), &b),
            Err(BootFailure::GptRequiresUefi)
        );
    }

    #[test]
    fn mbr_under_uefi_is_rejected() {
        let m = media(PartitionScheme::Mbr, true);
        let b = bios(BootMode::Uefi, false, true);
        assert_eq!(
            check_boot_compatibility(Some(&m), &b),
            Err(BootFailure::MbrRequiresLegacy)
        );
    }

    #[test]
    fn secure_boot_under_legacy_is_rejected() {
        let m = media(PartitionScheme::Mbr, true);
        let b = bios(BootMode::Legacy, true, true);
        assert_eq!(
            check_boot_compatibility(Some(&m), &b),
            Err(BootFailure::SecureBootRequiresUefi)
        );
    }

    #[test]
    fn fully_compatible_config_boots() {
        let m = media(PartitionScheme::Gpt, true);
        let b = bios(BootMode::Uefi, true, true);
        assert_eq!(check_boot_compatibility(Some(&m), &b), Ok(()));
    }

    #[test]
    fn checker_never_returns_os_not_found() {
        for scheme in [PartitionScheme::Gpt, PartitionScheme::Mbr] {
            for mode in [BootMode::Uefi, BootMode::Legacy] {
                for secure in [true, false] {
                    for usb in [true, false] {
                        for created in [true, false] {
                            let m = media(scheme, created);
                            let b = bios(mode, secure, usb);
                            assert_ne!(
                                check_boot_compatibility(Some(&m), &b),
                                Err(BootFailure::OsNotFound)
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn empty_boot_order_does_not_panic_the_checker() {
        let m = media(PartitionScheme::Gpt, true);
        let b = BiosConfig {
            boot_order: Vec::new(),
            ..BiosConfig::default()
        };
        assert_eq!(check_boot_compatibility(Some(&m), &b), Ok(()));
    }
}
