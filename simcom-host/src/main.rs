//! SimCom Console Test Bench
//!
//! Runs the move coordinator against an in-memory voice server and a virtual
//! simulator, driven from the terminal.

mod app;
mod console;
mod layout;
mod server;
mod settings;

use app::{log_events, SimComApp};
use console::{ConsoleCommand, ConsoleError};
use server::LoopbackServer;
use settings::{FileStore, Settings};
use simcom_nav::{run_nav_actor, ClientId, SimDataSink};
use simcom_sim::{run_virtual_sim_task, VirtualSimulator};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Local client id on the loopback server
const OWN_CLIENT: ClientId = ClientId(1);

/// Depth of the coordinator's command queue
const NAV_QUEUE_DEPTH: usize = 256;

#[tokio::main]
async fn main() {
    // Include all our crates in the default filter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "simcom=info,simcom_core=info,simcom_nav=info,simcom_sim=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SimCom test bench");

    let settings = Settings::load();
    let channels = match &settings.layout_file {
        Some(path) => layout::load_layout(path).unwrap_or_else(|e| {
            warn!("{}, using the demo layout", e);
            layout::demo_layout()
        }),
        None => layout::demo_layout(),
    };

    // Coordinator actor, fed by the server callbacks and the simulator
    let (nav_tx, nav_rx) = mpsc::channel(NAV_QUEUE_DEPTH);
    let (event_tx, event_rx) = mpsc::channel(256);
    let server = LoopbackServer::new(channels, OWN_CLIENT, nav_tx.clone());
    let store = FileStore::new(settings.clone());
    let nav_task = tokio::spawn(run_nav_actor(nav_rx, server.client(), store, event_tx));
    tokio::spawn(log_events(event_rx));

    let (sim_tx, sim_rx) = mpsc::channel(32);
    let sink = SimDataSink::new(nav_tx.clone());
    let sim_task = tokio::spawn(run_virtual_sim_task(
        VirtualSimulator::from_config(settings.simulator.clone()),
        sim_rx,
        move |reading| {
            sink.push(reading);
        },
    ));

    if let Err(e) = server.connect().await {
        warn!("Could not join the loopback server: {}", e);
    }

    let mut app = SimComApp::new(settings.navigation.clone(), nav_tx, sim_tx, server);
    println!("{} joined. Type help for commands.", settings.nickname);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read from stdin: {}", e);
                break;
            }
        };

        match console::parse(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => {
                if let Some(output) = app.execute(command).await {
                    println!("{}", output);
                }
            }
            Err(ConsoleError::Empty) => {}
            Err(e) => println!("{}", e),
        }
    }

    app.shutdown().await;
    let _ = nav_task.await;
    let _ = sim_task.await;
    info!("SimCom test bench stopped");
}
