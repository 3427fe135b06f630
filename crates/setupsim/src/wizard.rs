//! Setup-wizard session state: the strictly linear chain from language
//! selection to the reboot-required screen.
//!
//! The wizard owns the simulated disk layout and the copy stage's failure
//! decision. The decision lives here, not in per-entry stage state, because a
//! corrupt-file failure bounces the user back to the partition stage and the
//! retry bound must survive that bounce.

use serde::{Deserialize, Serialize};

use crate::failure::FailureDecision;

/// Installation flavor chosen on the install-type page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallType {
    Upgrade,
    Custom,
}

/// Role of a simulated partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKind {
    SystemReserved,
    Primary,
    Unallocated,
}

/// One row of the simulated disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimPartition {
    pub label: String,
    pub kind: PartitionKind,
    pub size_gb: u32,
}

/// The fixed disk fiction every session starts with
pub fn default_partition_table() -> Vec<SimPartition> {
    vec![
        SimPartition {
            label: "Drive 0 Partition 1: System Reserved".to_string(),
            kind: PartitionKind::SystemReserved,
            size_gb: 1,
        },
        SimPartition {
            label: "Drive 0 Partition 2".to_string(),
            kind: PartitionKind::Primary,
            size_gb: 237,
        },
        SimPartition {
            label: "Drive 0 Unallocated Space".to_string(),
            kind: PartitionKind::Unallocated,
            size_gb: 18,
        },
    ]
}

/// Mutable state of the setup wizard, owned by the orchestrator
#[derive(Debug, Clone)]
pub struct WizardState {
    pub language: String,
    pub product_key: Option<String>,
    pub key_skipped: bool,
    pub license_accepted: bool,
    pub install_type: Option<InstallType>,
    pub partitions: Vec<SimPartition>,
    pub selected_partition: Option<usize>,
    /// File-copy progress percent for the copying stage
    pub copy_progress: u8,
    /// Corruption decision for the copy stage; rolled on first entry and kept
    /// for the session so the retry bound holds across restarts
    pub copy_fault: Option<FailureDecision>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            language: "English (United States)".to_string(),
            product_key: None,
            key_skipped: false,
            license_accepted: false,
            install_type: None,
            partitions: default_partition_table(),
            selected_partition: None,
            copy_progress: 0,
            copy_fault: None,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a partition row. Out-of-range selections are rejected.
    pub fn select_partition(&mut self, index: usize) -> bool {
        if index >= self.partitions.len() {
            return false;
        }
        self.selected_partition = Some(index);
        true
    }

    /// Gate for leaving the partition page: a target must be selected and
    /// must be a plain primary partition.
    pub fn validate_target(&self) -> Result<(), &'static str> {
        let index = self
            .selected_partition
            .ok_or("Select a partition to install to.")?;
        match self.partitions[index].kind {
            PartitionKind::Primary => Ok(()),
            PartitionKind::Unallocated => {
                Err("Windows cannot be installed to unallocated space. Select a formatted partition.")
            }
            PartitionKind::SystemReserved => {
                Err("The system reserved partition cannot be used as an installation target.")
            }
        }
    }

    /// Gate for leaving the product-key page
    pub fn key_satisfied(&self) -> bool {
        self.product_key.is_some() || self.key_skipped
    }
}

/// Loose retail-key shape check: five dash-separated groups of five
/// alphanumerics. Cosmetic validation, not real key math.
pub fn product_key_ok(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .all(|g| g.len() == 5 && g.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_one_valid_target() {
        let wizard = WizardState::new();
        let valid: Vec<usize> = (0..wizard.partitions.len())
            .filter(|&i| wizard.partitions[i].kind == PartitionKind::Primary)
            .collect();
        assert_eq!(valid, vec![1]);
    }

    #[test]
    fn partition_gate_requires_a_selection() {
        let wizard = WizardState::new();
        assert!(wizard.validate_target().is_err());
    }

    #[test]
    fn partition_gate_rejects_unallocated_and_system() {
        let mut wizard = WizardState::new();

        assert!(wizard.select_partition(0));
        assert!(wizard.validate_target().is_err());

        assert!(wizard.select_partition(2));
        assert!(wizard.validate_target().is_err());

        assert!(wizard.select_partition(1));
        assert!(wizard.validate_target().is_ok());
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let mut wizard = WizardState::new();
        assert!(!wizard.select_partition(99));
        assert_eq!(wizard.selected_partition, None);
    }

    #[test]
    fn product_key_shape() {
        assert!(product_key_ok("VK7JG-NPHTM-C97JM-9MPGT-3V66T"));
        assert!(product_key_ok("ABCDE-12345-FGHIJ-67890-KLMNO"));
        assert!(!product_key_ok(""));
        assert!(!product_key_ok("VK7JG-NPHTM-C97JM-9MPGT"));
        assert!(!product_key_ok("VK7JG-NPHTM-C97JM-9MPGT-3V6"));
        assert!(!product_key_ok("VK7JG-NPHTM-C97JM-9MPGT-3V66T-EXTRA"));
        assert!(!product_key_ok("VK7J!-NPHTM-C97JM-9MPGT-3V66T"));
    }

    #[test]
    fn key_page_gate_accepts_key_or_skip() {
        let mut wizard = WizardState::new();
        assert!(!wizard.key_satisfied());
        wizard.key_skipped = true;
        assert!(wizard.key_satisfied());

        let mut with_key = WizardState::new();
        with_key.product_key = Some("VK7JG-NPHTM-C97JM-9MPGT-3V66T".to_string());
        assert!(with_key.key_satisfied());
    }
}
