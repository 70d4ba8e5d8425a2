//! Error types for frequency parsing and the channel directory

use thiserror::Error;

use crate::directory::ChannelId;

/// Errors that can occur while parsing a frequency string
///
/// Channel names that fail to parse are simply untagged; this error is only
/// surfaced by [`str::parse`] on [`crate::Frequency`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrequencyError {
    /// No `.` separating megahertz from decimals
    #[error("missing decimal point: {0:?}")]
    MissingDecimalPoint(String),

    /// Megahertz part is empty, too long, or not all digits
    #[error("invalid megahertz digits: {0:?}")]
    InvalidMegahertz(String),

    /// Decimal part is not two or three digits
    #[error("invalid decimal digits: {0:?}")]
    InvalidDecimals(String),
}

/// Errors returned by [`crate::ChannelDirectory`] operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// The channel is not in the directory
    #[error("unknown channel: {0}")]
    UnknownChannel(ChannelId),

    /// Linking the channel to this parent would close a loop
    #[error("channel {id} cannot be placed under {parent}: would create a cycle")]
    Cycle {
        /// Channel being inserted or updated
        id: ChannelId,
        /// Requested parent
        parent: ChannelId,
    },

    /// Id zero means "no parent" and can't name a channel
    #[error("channel id 0 is reserved")]
    InvalidChannelId,
}
