//! Scenario Simulator - scripted end-to-end runs of the installation core.
//!
//! Usage:
//!   scenario_sim --scenario happy-path
//!   scenario_sim --scenario firmware-mismatch
//!   scenario_sim --scenario flaky-install
//!
//! Drives a full simulation session the way a cooperative user would and
//! writes a machine-readable JSON report to ./artifacts/simulations/.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};

use setupsim::pacing;
use setupsim::oobe::UpdateCheckState;
use setupsim::tipgen::TipClient;
use setupsim::wizard::InstallType;
use setupsim::{
    Action, BiosConfig, BootMode, Event, FailureProfiles, MediaConfig, PartitionScheme,
    SimOptions, Simulation, Stage, SyntheticConfig,
};

#[derive(Parser)]
#[command(name = "scenario_sim", about = "Run scripted installation scenarios")]
struct Args {
    /// Scenario to run: happy-path, firmware-mismatch, or flaky-install
    #[arg(long, default_value = "happy-path")]
    scenario: String,

    /// RNG seed for reproducible failure draws
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Report output directory
    #[arg(long, default_value = "artifacts/simulations")]
    out_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct ScenarioReport {
    scenario: String,
    session_id: String,
    generated_at: String,
    seed: u64,
    steps_taken: usize,
    stages_visited: Vec<String>,
    boot_failures_seen: Vec<String>,
    install_tips: Vec<String>,
    completed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args = Args::parse();
    info!("scenario '{}' starting (seed {})", args.scenario, args.seed);

    // Cosmetic strings come from the optional generation service; the
    // fallbacks are used automatically when it is absent.
    let tips = TipClient::new().generate_tips().await;

    let report = match args.scenario.as_str() {
        "happy-path" => run_scenario(&args, FailureProfiles::never_fail(), None, tips),
        "flaky-install" => run_scenario(&args, FailureProfiles::always_fail_first(), None, tips),
        "firmware-mismatch" => {
            // MBR media under UEFI firmware: the first boot fails until the
            // script fixes the firmware settings.
            let synthetic = SyntheticConfig {
                media: Some(MediaConfig {
                    partition_scheme: PartitionScheme::Mbr,
                    ..MediaConfig::synthesized()
                }),
                bios: Some(BiosConfig::default()),
            };
            run_scenario(&args, FailureProfiles::never_fail(), Some(synthetic), tips)
        }
        other => bail!("unknown scenario '{}'", other),
    };

    let out_dir = &args.out_dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating report directory {}", out_dir.display()))?;
    let path = out_dir.join(format!("{}.json", args.scenario));
    fs::write(&path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("writing report to {}", path.display()))?;

    info!(
        "scenario '{}' {} after {} steps ({} stages visited), report: {}",
        report.scenario,
        if report.completed { "completed" } else { "DID NOT COMPLETE" },
        report.steps_taken,
        report.stages_visited.len(),
        path.display()
    );

    if !report.completed {
        bail!("scenario '{}' did not reach the desktop", args.scenario);
    }
    Ok(())
}

fn run_scenario(
    args: &Args,
    profiles: FailureProfiles,
    synthetic: Option<SyntheticConfig>,
    tips: Vec<String>,
) -> ScenarioReport {
    let mut sim = Simulation::with_options(SimOptions {
        initial_stage: Stage::MediaCreator,
        seed: Some(args.seed),
        profiles,
    });
    sim.set_install_tips(tips);

    if let Some(synthetic) = synthetic {
        // Skip the media creator: start at POST with the synthetic config
        sim.jump_to_stage(Stage::BiosPost, Some(synthetic));
    }

    let mut boot_failures = Vec::new();
    let mut steps = 0usize;
    const MAX_STEPS: usize = 500;

    while sim.current_stage() != Stage::Desktop && steps < MAX_STEPS {
        steps += 1;
        if let Some(reason) = sim.boot_error() {
            boot_failures.push(reason.to_string());
        }
        step(&mut sim);
    }

    ScenarioReport {
        scenario: args.scenario.clone(),
        session_id: sim.session_id().to_string(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        seed: args.seed,
        steps_taken: steps,
        stages_visited: sim.history().iter().map(|s| format!("{:?}", s)).collect(),
        boot_failures_seen: boot_failures,
        install_tips: sim.install_tips().to_vec(),
        completed: sim.current_stage() == Stage::Desktop,
    }
}

/// One cooperative-user step for the current stage
fn step(sim: &mut Simulation) {
    let act = |sim: &mut Simulation, action: Action| sim.dispatch(Event::Action(action));

    match sim.current_stage() {
        Stage::MediaCreator => {
            if sim.media_ready() {
                act(sim, Action::CloseMediaCreator);
            } else {
                act(sim, Action::StartBurn);
                sim.advance(pacing::media::BURN_TICK);
            }
        }
        Stage::BiosPost => sim.advance(pacing::post::AUTO_ADVANCE),
        Stage::BiosSetup => {
            // The firmware-mismatch script lands here after a failed boot:
            // switch to Legacy and drop Secure Boot so MBR media can start
            if sim.bios().boot_mode == BootMode::Uefi {
                act(sim, Action::ToggleBootMode);
            }
            if sim.bios_draft().map(|d| d.secure_boot).unwrap_or(false) {
                act(sim, Action::ToggleSecureBoot);
            }
            act(sim, Action::SaveBiosAndExit);
        }
        Stage::BootCheck => unreachable!("transient stage must never be current"),
        Stage::BootPrompt => act(sim, Action::PressAnyKey),
        Stage::BootError => {
            act(sim, Action::DismissBootError);
            // Head into setup to fix the firmware instead of looping on POST
            act(sim, Action::EnterBiosSetup);
        }
        Stage::BootLogo => sim.advance(pacing::boot::LOGO_HOLD),
        Stage::SetupLanguage => act(sim, Action::Continue),
        Stage::SetupInstallNow => act(sim, Action::InstallNow),
        Stage::SetupProductKey => act(sim, Action::SkipProductKey),
        Stage::SetupLicense => {
            if sim.wizard().license_accepted {
                act(sim, Action::Continue);
            } else {
                act(sim, Action::ToggleLicenseAccepted);
            }
        }
        Stage::SetupInstallType => act(sim, Action::SelectInstallType(InstallType::Custom)),
        Stage::SetupPartition => {
            act(sim, Action::SelectPartition(1));
            act(sim, Action::Continue);
        }
        Stage::SetupCopying => sim.advance(pacing::wizard::COPY_TICK),
        Stage::SetupRebootRequired => act(sim, Action::RestartNow),
        Stage::Rebooting => sim.advance(pacing::wizard::REBOOT_HOLD),
        Stage::OobeRegion => act(sim, Action::Continue),
        Stage::OobeNetwork => act(sim, Action::ConnectNetwork),
        Stage::OobeUpdateCheck => {
            if sim.oobe().update_state == UpdateCheckState::Failed {
                act(sim, Action::RetryUpdateCheck);
            }
            sim.advance(pacing::oobe::UPDATE_CHECK_DELAY);
        }
        Stage::OobeAccount => {
            if sim.oobe().username.is_empty() {
                act(sim, Action::SetUsername("demo".to_string()));
            }
            act(sim, Action::Continue);
        }
        Stage::OobeSecurityQuestions => {
            for i in 0..3 {
                act(sim, Action::AnswerSecurityQuestion(i, "scripted".to_string()));
            }
            act(sim, Action::Continue);
        }
        Stage::OobePrivacy => act(sim, Action::AcceptPrivacySettings),
        Stage::GettingReady => sim.advance(pacing::oobe::GETTING_READY_HOLD),
        Stage::DriverSetup => {
            if !sim.drivers().scanned {
                act(sim, Action::ScanDrivers);
            } else if sim.drivers().has_error() {
                act(sim, Action::RetryFailedDriver);
            } else if !sim.drivers().installing() && !sim.drivers().all_installed() {
                act(sim, Action::InstallDrivers);
            }
            sim.advance(pacing::drivers::INSTALL_TICK);
        }
        Stage::Desktop => {}
        Stage::Recovery => act(sim, Action::DismissRecovery),
    }
}
