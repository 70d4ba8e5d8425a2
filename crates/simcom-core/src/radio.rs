//! Simulator radio readings
//!
//! The data contract between a simulator data source and the coordinator:
//! one immutable snapshot per poll.

use std::fmt;

use crate::frequency::Frequency;

/// Which COM radio the pilot is listening on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComSelector {
    /// No radio selected
    #[default]
    None,
    /// COM1
    Com1,
    /// COM2
    Com2,
    /// Both radios at once
    Both,
}

impl ComSelector {
    /// Decode the simulator's selector value (1 = COM1, 2 = COM2, 3 = both)
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Com1,
            2 => Self::Com2,
            3 => Self::Both,
            _ => Self::None,
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "Unrecognised",
            Self::Com1 => "COM1",
            Self::Com2 => "COM2",
            Self::Both => "COM1+2",
        }
    }
}

/// One radio/connectivity reading from the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimComData {
    /// Selected radio
    pub selected: ComSelector,
    /// COM1 active frequency
    pub com1: Frequency,
    /// COM1 standby frequency
    pub com1_standby: Frequency,
    /// COM2 active frequency
    pub com2: Frequency,
    /// COM2 standby frequency
    pub com2_standby: Frequency,
    /// Whether the simulator link is up
    pub connected: bool,
}

impl SimComData {
    /// Frequency of the selected radio
    ///
    /// `None` when no single radio is selected; the coordinator treats that
    /// like an unmatched frequency.
    pub fn active_frequency(&self) -> Option<Frequency> {
        match self.selected {
            ComSelector::Com1 => Some(self.com1),
            ComSelector::Com2 => Some(self.com2),
            ComSelector::None | ComSelector::Both => None,
        }
    }
}

impl fmt::Display for SimComData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.connected {
            return write!(f, "[sim disconnected]");
        }
        write!(
            f,
            "{} selected, COM1 {} ({}), COM2 {} ({})",
            self.selected.name(),
            self.com1,
            self.com1_standby,
            self.com2,
            self.com2_standby
        )
    }
}
