//! Device adapter traits.
//!
//! Every hardware source sits behind [`Device`]; the core never talks to a
//! hardware SDK directly. That keeps the process-wide driver state inside the
//! backends and lets tests swap in [`virtual_input`](crate::backends::virtual_input)
//! fakes.

use crate::error::InputResult;
use crate::frame::RawFrame;
use crate::metadata::DeviceMeta;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an adapter addresses its hardware.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceHandle {
    /// Index among the wheel-class devices the driver enumerates.
    Index(usize),
    /// Serial port name (`COM3`, `/dev/ttyACM0`).
    Port(String),
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceHandle::Index(i) => write!(f, "input {i}"),
            DeviceHandle::Port(p) => write!(f, "port {p}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub handle: DeviceHandle,
}

/// Spring-force parameters sent to a wheel, all in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForceFeedbackCommand {
    /// Center of the spring, `-100..=100`.
    pub offset_percent: i32,
    /// Maximum force, `0..=100`.
    pub saturation_percent: i32,
    /// Slope of force against deflection, `-100..=100`.
    pub coefficient_percent: i32,
}

impl ForceFeedbackCommand {
    pub fn spring(offset_percent: i32, saturation_percent: i32, coefficient_percent: i32) -> Self {
        Self {
            offset_percent: offset_percent.clamp(-100, 100),
            saturation_percent: saturation_percent.clamp(0, 100),
            coefficient_percent: coefficient_percent.clamp(-100, 100),
        }
    }
}

impl Default for ForceFeedbackCommand {
    fn default() -> Self {
        Self::spring(0, 30, 100)
    }
}

/// Common interface of every input source.
pub trait Device {
    fn name(&self) -> &str;

    /// Read the latest frame.
    ///
    /// `Ok(None)` means the device is fine but produced nothing new this tick.
    /// `Err(DeviceNotConnected)` is expected while hardware is absent and is not fatal.
    fn poll(&mut self) -> InputResult<Option<RawFrame>>;

    fn connection_status(&self) -> ConnectionStatus;

    /// Release the device. `shutdown_module` additionally tears down the
    /// process-wide driver; only do that once, at process exit.
    fn disconnect(&mut self, shutdown_module: bool);

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta::default()
    }
}

/// A steering wheel with optional force feedback.
pub trait WheelDevice: Device {
    /// Attempt (re)connection. Cheap enough to call every tick.
    fn try_connect(&mut self) -> InputResult<()>;

    fn has_force_feedback(&self) -> bool;

    /// Best-effort: start or update the centering spring.
    fn issue_force(&mut self, command: ForceFeedbackCommand);

    /// Best-effort: stop any active spring. Safe to call when disconnected.
    fn stop_force(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spring_parameters_are_clamped() {
        let cmd = ForceFeedbackCommand::spring(-250, 130, 400);
        assert_eq!(cmd.offset_percent, -100);
        assert_eq!(cmd.saturation_percent, 100);
        assert_eq!(cmd.coefficient_percent, 100);
    }

    #[test]
    fn default_is_plain_centering_spring() {
        let cmd = ForceFeedbackCommand::default();
        assert_eq!(cmd, ForceFeedbackCommand::spring(0, 30, 100));
    }

    #[test]
    fn handle_display() {
        assert_eq!(DeviceHandle::Index(2).to_string(), "input 2");
        assert_eq!(DeviceHandle::Port("COM4".into()).to_string(), "port COM4");
    }
}
