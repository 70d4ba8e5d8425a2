//! SimCom Simulator Library
//!
//! This crate stands in for a flight simulator so SimCom can be exercised
//! without one. It includes:
//!
//! - **Registers**: decoding of the simulator's BCD COM words and radio switch
//! - **VirtualSimulator**: a cockpit radio panel that reads like a real one
//! - **run_virtual_sim_task**: the fixed-cadence polling task that pushes
//!   changed readings to a callback
//!
//! # Example
//!
//! ```rust
//! use simcom_sim::{decode_com_bcd, ComRadio, VirtualSimulator};
//! use simcom_core::ComSelector;
//!
//! let mut sim = VirtualSimulator::default();
//! sim.set_active(ComRadio::Com2, decode_com_bcd(0x1830).unwrap()).unwrap();
//! sim.select(ComSelector::Com2);
//!
//! assert_eq!(sim.reading().active_frequency().unwrap().to_string(), "118.30");
//! ```

pub mod error;
pub mod registers;
pub mod simulator;
pub mod task;

pub use error::SimError;
pub use registers::{decode_com_bcd, decode_radio_switch, encode_com_bcd, encode_radio_switch};
pub use simulator::{ComRadio, VirtualSimConfig, VirtualSimulator, COM_BAND_HIGH, COM_BAND_LOW};
pub use task::{run_virtual_sim_task, VirtualSimCommand, POLL_INTERVAL_MS};
