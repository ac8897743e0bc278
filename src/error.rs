//! Error taxonomy for adapters, config loading and the tick loop.
//!
//! None of these are fatal to a session. The tick loop logs them and skips the
//! affected source for the current tick; everything else keeps running.

use thiserror::Error;

/// Errors raised by device adapters, config loading and dispatch.
#[derive(Debug, Error)]
pub enum InputError {
    /// The adapter has no live driver/handle right now. Retried every tick.
    #[error("device {device} is not connected")]
    DeviceNotConnected { device: String },

    /// The device is connected but this poll failed. The tick skips the source.
    #[error("read from {device} failed: {reason}")]
    DeviceReadFailure { device: String, reason: String },

    /// A frame could not be decoded. Serial fields fall back to zero instead.
    #[error("malformed frame from {device}: {reason}")]
    MalformedFrame { device: String, reason: String },

    /// A collaborator the tick needs (the vehicle sink) is absent.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Opening the serial port failed (busy, nonexistent, permission).
    #[error("could not open serial port {port} at {baud_rate} baud: {reason}")]
    SerialConnect {
        port: String,
        baud_rate: u32,
        reason: String,
    },

    /// The hardware driver module was shut down; no further hardware calls are allowed.
    #[error("hardware module for {device} has been shut down")]
    ModuleShutDown { device: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for InputError {
    fn from(e: toml::de::Error) -> Self {
        InputError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for InputError {
    fn from(e: serde_json::Error) -> Self {
        InputError::Config(e.to_string())
    }
}

impl InputError {
    /// `true` for errors that mean "try again next tick" rather than "this frame was bad".
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            InputError::DeviceNotConnected { .. } | InputError::ModuleShutDown { .. }
        )
    }
}

pub type InputResult<T> = Result<T, InputError>;
