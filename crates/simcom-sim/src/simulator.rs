//! Virtual radio panel
//!
//! Holds the same registers a simulator exposes (BCD COM words and the radio
//! switch byte) and decodes them into a [`SimComData`] reading on demand, the
//! way a polling client reads a real simulator.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use simcom_core::{ComSelector, Frequency, SimComData};

use crate::error::SimError;
use crate::registers::{decode_com_bcd, decode_radio_switch, encode_com_bcd, encode_radio_switch};

/// Lowest tunable COM frequency, 118.00
pub const COM_BAND_LOW: Frequency = Frequency::from_hundredths(11_800);

/// Highest tunable COM frequency, 136.99
pub const COM_BAND_HIGH: Frequency = Frequency::from_hundredths(13_699);

/// Which COM radio an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComRadio {
    /// COM1
    Com1,
    /// COM2
    Com2,
}

impl ComRadio {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Com1 => "COM1",
            Self::Com2 => "COM2",
        }
    }
}

/// Configuration for creating a virtual simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualSimConfig {
    /// Display name
    pub id: String,
    /// COM1 active frequency
    pub com1: Frequency,
    /// COM1 standby frequency
    pub com1_standby: Frequency,
    /// COM2 active frequency
    pub com2: Frequency,
    /// COM2 standby frequency
    pub com2_standby: Frequency,
    /// Selected radio
    pub selected: ComSelector,
    /// Whether the simulator starts connected
    pub connected: bool,
}

impl Default for VirtualSimConfig {
    fn default() -> Self {
        Self {
            id: "Virtual Sim".to_string(),
            com1: Frequency::from_hundredths(12_280),
            com1_standby: Frequency::from_hundredths(11_830),
            com2: Frequency::from_hundredths(12_150),
            com2_standby: Frequency::from_hundredths(12_190),
            selected: ComSelector::Com1,
            connected: true,
        }
    }
}

/// A simulated cockpit radio panel
#[derive(Debug, Clone)]
pub struct VirtualSimulator {
    id: String,
    com1: u16,
    com1_standby: u16,
    com2: u16,
    com2_standby: u16,
    radio_switch: u8,
    connected: bool,
    last_change: Instant,
}

impl Default for VirtualSimulator {
    fn default() -> Self {
        Self::from_config(VirtualSimConfig::default())
    }
}

impl VirtualSimulator {
    /// Create a virtual simulator from configuration
    ///
    /// Frequencies outside the COM band start at the band edge.
    pub fn from_config(config: VirtualSimConfig) -> Self {
        Self {
            id: config.id,
            com1: register(config.com1),
            com1_standby: register(config.com1_standby),
            com2: register(config.com2),
            com2_standby: register(config.com2_standby),
            radio_switch: encode_radio_switch(config.selected),
            connected: config.connected,
            last_change: Instant::now(),
        }
    }

    /// Get the simulator's identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tune a radio's active frequency
    pub fn set_active(&mut self, radio: ComRadio, frequency: Frequency) -> Result<(), SimError> {
        let raw = checked_register(frequency)?;
        match radio {
            ComRadio::Com1 => self.com1 = raw,
            ComRadio::Com2 => self.com2 = raw,
        }
        self.last_change = Instant::now();
        Ok(())
    }

    /// Tune a radio's standby frequency
    pub fn set_standby(&mut self, radio: ComRadio, frequency: Frequency) -> Result<(), SimError> {
        let raw = checked_register(frequency)?;
        match radio {
            ComRadio::Com1 => self.com1_standby = raw,
            ComRadio::Com2 => self.com2_standby = raw,
        }
        self.last_change = Instant::now();
        Ok(())
    }

    /// Press the transfer button: exchange active and standby
    pub fn swap(&mut self, radio: ComRadio) {
        match radio {
            ComRadio::Com1 => std::mem::swap(&mut self.com1, &mut self.com1_standby),
            ComRadio::Com2 => std::mem::swap(&mut self.com2, &mut self.com2_standby),
        }
        self.last_change = Instant::now();
    }

    /// Set the radio switch panel
    pub fn select(&mut self, selector: ComSelector) {
        self.radio_switch = encode_radio_switch(selector);
        self.last_change = Instant::now();
    }

    /// Bring the simulator link up or down
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.last_change = Instant::now();
    }

    /// Whether the simulator link is up
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Get the time of last state change
    pub fn last_change(&self) -> Instant {
        self.last_change
    }

    /// Read the registers the way a polling client would
    pub fn reading(&self) -> SimComData {
        if !self.connected {
            return SimComData::default();
        }
        SimComData {
            selected: decode_radio_switch(self.radio_switch),
            com1: decode_com_bcd(self.com1).unwrap_or_default(),
            com1_standby: decode_com_bcd(self.com1_standby).unwrap_or_default(),
            com2: decode_com_bcd(self.com2).unwrap_or_default(),
            com2_standby: decode_com_bcd(self.com2_standby).unwrap_or_default(),
            connected: true,
        }
    }
}

fn checked_register(frequency: Frequency) -> Result<u16, SimError> {
    if frequency < COM_BAND_LOW || frequency > COM_BAND_HIGH {
        return Err(SimError::OutOfBand(frequency));
    }
    Ok(register(frequency))
}

fn register(frequency: Frequency) -> u16 {
    let clamped = frequency.clamp(COM_BAND_LOW, COM_BAND_HIGH);
    encode_com_bcd(clamped).unwrap_or(0x1800)
}
