//! Error types for the move coordinator

use simcom_core::DirectoryError;
use thiserror::Error;

/// Errors that can occur in the coordinator and its collaborators
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
    /// Directory rejected an operation
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Voice client call failed
    #[error("voice client error: {0}")]
    Client(String),

    /// Settings could not be loaded or saved
    #[error("settings error: {0}")]
    Settings(String),

    /// Settings commit refused
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// No voice server session
    #[error("not connected to a voice server")]
    NotConnected,

    /// Mode name not recognised
    #[error("unknown mode: {0:?}")]
    UnknownMode(String),
}
