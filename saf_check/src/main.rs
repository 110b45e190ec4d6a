use crate::{
    command_executor::{
        CommandExecutor,
        devices::{
            SessionHandler, command_sender::SessionCommandSender, commands::CheckOutcome,
        },
    },
    config::{SafConfig, create_default_config, init_config},
};

use saf_devices::SimulatedProxy;
use std::path::PathBuf;

pub mod command_executor;
pub mod config;
pub mod logging;

fn should_create_config() -> bool {
    std::env::var("CREATE_CONFIG")
        .map(|val| val == "1" || val.to_lowercase() == "true")
        .unwrap_or(false)
}

fn create_session(config: &SafConfig) -> (CommandExecutor<SessionHandler>, SessionCommandSender) {
    let mut ccd = config.ccd.clone();
    for wheel in &mut ccd.filter_wheels {
        wheel.mark_empty_slots(config.empty_slot_names.as_slice());
    }

    let proxy = SimulatedProxy::from_config(&config.simulator);
    let handler = SessionHandler::new(Box::new(proxy), ccd, config.focuser.clone());

    let executor = CommandExecutor::new(handler);
    let sender = SessionCommandSender::new(executor.sender());

    (executor, sender)
}

/// Failed checks have already been logged by the device records.
fn report(outcomes: &[CheckOutcome]) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        if outcome.passed {
            tracing::info!("{}: present", outcome.device);
        } else {
            failed += 1;
        }
    }
    failed
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if should_create_config() {
        create_default_config(None::<PathBuf>)?;
    }

    let (_config_manager, config) = init_config().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Run with CREATE_CONFIG=1 to create a default configuration file.");
        e
    })?;

    let _log_guard = logging::init(&config.logging)?;

    let (executor, sender) = create_session(&config);
    let session = executor.spawn();

    let mut failed = 0;
    failed += report(&sender.check_filter_wheels().await?);
    failed += report(&sender.check_camera().await?);
    failed += report(&sender.check_focuser().await?);

    if let Some(target) = config.focus_default_target {
        match sender.write_focus_default(Some(target)).await? {
            Ok(focus_default) => tracing::info!(
                "{}: FOC_DEF set to {}",
                config.focuser.name,
                focus_default
            ),
            Err(e) => {
                tracing::error!("{}", e);
                failed += 1;
            }
        }
    }

    let snapshot = sender.snapshot().await?;
    tracing::info!(
        "{}: travel {}..{}, default {:?}",
        config.focuser.name,
        snapshot.focus_min,
        snapshot.focus_max,
        snapshot.focus_default
    );
    for wheel in &snapshot.wheels {
        tracing::info!("{}: empty slots {:?}", wheel.wheel, wheel.empty_slots);
    }

    drop(sender);
    session.await?;

    if failed > 0 {
        anyhow::bail!("{} device check(s) failed", failed);
    }

    Ok(())
}
