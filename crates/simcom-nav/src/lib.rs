//! SimCom move coordinator
//!
//! This crate keeps the local voice client in the channel that matches the
//! COM frequency tuned in the simulator.
//!
//! # Architecture
//!
//! The [`Coordinator`] is a plain state machine: it owns the session's
//! channel directory, the navigation state and the settings, and turns inputs
//! into optional move requests. It runs in one of three modes:
//!
//! - **Disabled**: never moves, only tracks where the user is
//! - **Manual**: moves on tuning, lets the user wander off afterwards
//! - **Auto**: moves on tuning and pulls the user back after any outside move
//!
//! # Actor-Based Architecture
//!
//! Hosts run the coordinator inside [`run_nav_actor`]:
//! - The simulator callback pushes readings through a [`SimDataSink`]
//! - Voice client callbacks arrive as [`NavCommand`]s on the same queue
//! - Moves go out through the host's [`VoiceClient`] implementation
//! - Everything observable is emitted as a [`NavEvent`]
//!
//! # Example
//!
//! ```rust
//! use simcom_core::{ChannelEntry, ChannelId, ComSelector, SimComData};
//! use simcom_nav::{ClientId, Coordinator, Mode, NavSettings};
//!
//! let mut coordinator = Coordinator::new(NavSettings {
//!     mode: Mode::Auto,
//!     ..Default::default()
//! });
//! coordinator.connect(
//!     ClientId(1),
//!     Some(ChannelId(1)),
//!     vec![
//!         ChannelEntry::new(1, "Lobby", 0),
//!         ChannelEntry::new(2, "Tower - 118.300", 1),
//!     ],
//! );
//!
//! let request = coordinator.on_sim_data(SimComData {
//!     selected: ComSelector::Com1,
//!     com1: "118.30".parse().unwrap(),
//!     connected: true,
//!     ..Default::default()
//! });
//! assert_eq!(request.map(|r| r.target), Some(ChannelId(2)));
//! ```

pub mod actor;
pub mod client;
pub mod engine;
pub mod error;
pub mod events;
pub mod settings;
pub mod state;

// Re-export actor types
pub use actor::{run_nav_actor, NavCommand, SimDataSink, PENDING_SWEEP_INTERVAL};

// Re-export adapter types
pub use client::{SessionSnapshot, VoiceClient};

// Re-export event types
pub use events::NavEvent;

// Re-export engine types
pub use engine::{Coordinator, NavStatus, PENDING_MOVE_TIMEOUT};
pub use error::NavError;
pub use settings::{MemoryStore, NavSettings, SettingsStore};
pub use state::{ClientId, Mode, MoveReason, MoveRequest, MoveToken, NavigationState, PendingMove};
