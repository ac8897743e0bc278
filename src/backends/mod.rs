//! Input backends for `wheelup`.
//!
//! Implementations of [`Device`] / [`WheelDevice`] for concrete input sources,
//! and the [`DeviceRegistry`] that picks which ones a session runs with.
//!
//! - [`hid_wheel`]: force-feedback wheel over `hidapi`
//! - [`serial_port`]: microcontroller board over `serialport`
//! - [`virtual_input`]: scripted fakes for tests and demos
//!
//! Backend selection is a runtime decision driven by [`RigConfig`], not a build
//! flag: every backend is always compiled, and the registry records which
//! capabilities ended up available.

pub mod hid_wheel;
pub mod serial_port;
pub mod virtual_input;

use crate::config::RigConfig;
use crate::device::{Device, WheelDevice};
use crate::error::InputError;
use hid_wheel::HidWheel;
use serial_port::SerialAdapter;
use tracing::{info, warn};

/// What the session can do with the adapters it ended up with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub wheel: bool,
    pub serial: bool,
}

/// Adapters selected for one session.
#[derive(Default)]
pub struct DeviceRegistry {
    wheel: Option<Box<dyn WheelDevice>>,
    serial: Option<Box<dyn Device>>,
    startup_errors: Vec<InputError>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the hardware adapters `config` asks for.
    ///
    /// The serial port is opened here, once. If that fails the error is logged,
    /// kept in [`startup_errors`](Self::startup_errors), and the session runs
    /// without serial input. The wheel is only constructed; it connects from the tick.
    pub fn from_config(config: &RigConfig) -> Self {
        let mut registry = Self::new();

        if config.wheel.enabled {
            registry.wheel = Some(Box::new(HidWheel::new(config.wheel.device_index)));
        }

        if config.serial.enabled {
            match SerialAdapter::connect(
                &config.serial.port,
                config.serial.baud_rate,
                config.serial.hardware_flow_control,
            ) {
                Ok(adapter) => registry.serial = Some(Box::new(adapter)),
                Err(e) => {
                    warn!("serial port is not connected: {e}");
                    registry.startup_errors.push(e);
                }
            }
        }

        info!(capabilities = ?registry.capabilities(), "device registry ready");
        registry
    }

    pub fn with_wheel(mut self, wheel: impl WheelDevice + 'static) -> Self {
        self.wheel = Some(Box::new(wheel));
        self
    }

    pub fn with_serial(mut self, serial: impl Device + 'static) -> Self {
        self.serial = Some(Box::new(serial));
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            wheel: self.wheel.is_some(),
            serial: self.serial.is_some(),
        }
    }

    pub fn wheel_mut(&mut self) -> Option<&mut (dyn WheelDevice + 'static)> {
        self.wheel.as_deref_mut()
    }

    pub fn serial_mut(&mut self) -> Option<&mut (dyn Device + 'static)> {
        self.serial.as_deref_mut()
    }

    pub fn wheel(&self) -> Option<&(dyn WheelDevice + 'static)> {
        self.wheel.as_deref()
    }

    pub fn serial(&self) -> Option<&(dyn Device + 'static)> {
        self.serial.as_deref()
    }

    /// Errors hit while opening adapters at session start.
    pub fn startup_errors(&self) -> &[InputError] {
        &self.startup_errors
    }

    /// Disconnect every adapter. See [`Device::disconnect`] for `shutdown_module`.
    pub fn disconnect_all(&mut self, shutdown_module: bool) {
        if let Some(wheel) = self.wheel.as_deref_mut() {
            wheel.disconnect(shutdown_module);
        }
        if let Some(serial) = self.serial.as_deref_mut() {
            serial.disconnect(shutdown_module);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualSerial, VirtualWheel};

    #[test]
    fn empty_config_sections_disable_backends() {
        let mut cfg = RigConfig::default();
        cfg.wheel.enabled = false;
        let registry = DeviceRegistry::from_config(&cfg);
        assert_eq!(registry.capabilities(), Capabilities::default());
        assert!(registry.startup_errors().is_empty());
    }

    #[test]
    fn failed_serial_open_is_recorded_not_fatal() {
        let mut cfg = RigConfig::default();
        cfg.wheel.enabled = false;
        cfg.serial.enabled = true;
        cfg.serial.port = "/definitely/not/a/port".to_string();
        let registry = DeviceRegistry::from_config(&cfg);
        assert!(!registry.capabilities().serial);
        assert!(matches!(
            registry.startup_errors(),
            [InputError::SerialConnect { .. }]
        ));
    }

    #[test]
    fn wheel_from_config_starts_disconnected() {
        let registry = DeviceRegistry::from_config(&RigConfig::default());
        let caps = registry.capabilities();
        assert!(caps.wheel);
        let connected = registry
            .wheel()
            .is_some_and(|w| w.connection_status().connected);
        assert!(!connected);
    }

    #[test]
    fn injected_adapters_are_reported() {
        let serial = serial_port::SerialAdapter::with_link("v0", 9600, Box::new(VirtualSerial::new()));
        let registry = DeviceRegistry::new()
            .with_wheel(VirtualWheel::new(true))
            .with_serial(serial);
        assert_eq!(
            registry.capabilities(),
            Capabilities {
                wheel: true,
                serial: true
            }
        );
    }
}
