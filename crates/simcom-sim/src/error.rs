//! Error types for the virtual simulator

use simcom_core::Frequency;
use thiserror::Error;

/// Errors raised when driving the virtual radio panel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Outside the VHF airband a COM radio can tune
    #[error("{0} is outside the COM band (118.00 to 136.99)")]
    OutOfBand(Frequency),
}
