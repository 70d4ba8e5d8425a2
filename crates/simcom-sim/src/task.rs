//! Virtual simulator polling task
//!
//! Owns a [`VirtualSimulator`] and polls it at a fixed cadence, the way a
//! simulator client polls its data source. Readings are handed to a callback
//! only when they differ from the previous one, plus once at start. Control
//! commands change the panel between polls.

use std::time::Duration;

use simcom_core::{ComSelector, Frequency, SimComData};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::SimError;
use crate::simulator::{ComRadio, VirtualSimulator};

/// Polling interval in milliseconds
pub const POLL_INTERVAL_MS: u64 = 250;

/// Commands that can be sent to a virtual simulator task
#[derive(Debug)]
pub enum VirtualSimCommand {
    /// Tune a radio's active frequency
    SetActive {
        /// Radio to tune
        radio: ComRadio,
        /// New frequency
        frequency: Frequency,
        /// Channel to send back the outcome
        response: Option<oneshot::Sender<Result<(), SimError>>>,
    },
    /// Tune a radio's standby frequency
    SetStandby {
        /// Radio to tune
        radio: ComRadio,
        /// New frequency
        frequency: Frequency,
        /// Channel to send back the outcome
        response: Option<oneshot::Sender<Result<(), SimError>>>,
    },
    /// Exchange active and standby
    Swap(ComRadio),
    /// Set the radio switch panel
    Select(ComSelector),
    /// Bring the simulator link up or down
    SetConnected(bool),
    /// Query the current reading
    QueryReading(oneshot::Sender<SimComData>),
    /// Shutdown the virtual simulator task
    Shutdown,
}

/// Run the virtual simulator task
///
/// Returns the simulator when shut down or when every command sender is
/// dropped.
pub async fn run_virtual_sim_task<F>(
    mut sim: VirtualSimulator,
    mut cmd_rx: mpsc::Receiver<VirtualSimCommand>,
    mut on_reading: F,
) -> VirtualSimulator
where
    F: FnMut(SimComData) + Send,
{
    info!(
        "Starting virtual simulator {} (poll every {}ms)",
        sim.id(),
        POLL_INTERVAL_MS
    );

    let mut poll_timer = interval(Duration::from_millis(POLL_INTERVAL_MS));
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last: Option<SimComData> = None;

    loop {
        tokio::select! {
            _ = poll_timer.tick() => {
                let reading = sim.reading();
                if last != Some(reading) {
                    debug!("Virtual simulator {}: {}", sim.id(), reading);
                    on_reading(reading);
                    last = Some(reading);
                }
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    VirtualSimCommand::SetActive { radio, frequency, response } => {
                        let result = sim.set_active(radio, frequency);
                        report(radio, frequency, result, response);
                    }
                    VirtualSimCommand::SetStandby { radio, frequency, response } => {
                        let result = sim.set_standby(radio, frequency);
                        report(radio, frequency, result, response);
                    }
                    VirtualSimCommand::Swap(radio) => {
                        debug!("{} transfer", radio.name());
                        sim.swap(radio);
                    }
                    VirtualSimCommand::Select(selector) => {
                        debug!("Radio switch: {}", selector.name());
                        sim.select(selector);
                    }
                    VirtualSimCommand::SetConnected(connected) => {
                        info!(
                            "Virtual simulator {} {}",
                            sim.id(),
                            if connected { "connected" } else { "disconnected" }
                        );
                        sim.set_connected(connected);
                    }
                    VirtualSimCommand::QueryReading(response) => {
                        let _ = response.send(sim.reading());
                    }
                    VirtualSimCommand::Shutdown => {
                        info!("Virtual simulator {} shutting down", sim.id());
                        break;
                    }
                }
            }
        }
    }

    sim
}

fn report(
    radio: ComRadio,
    frequency: Frequency,
    result: Result<(), SimError>,
    response: Option<oneshot::Sender<Result<(), SimError>>>,
) {
    match &result {
        Ok(()) => debug!("{} tuned to {}", radio.name(), frequency),
        Err(e) => warn!("{} not tuned: {}", radio.name(), e),
    }
    if let Some(response) = response {
        let _ = response.send(result);
    }
}
