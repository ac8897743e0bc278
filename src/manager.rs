//! Session object: owns the adapters and runs the per-frame tick.
//!
//! [`RigManager::tick`] is the only place control flows through. It runs, in
//! order:
//!
//! 1. wheel: reconnect if needed, poll, feed the change logger
//! 2. serial: take the newest complete line
//! 3. keyboard: drain what the host pushed since the last tick
//! 4. arbitration and dispatch to the [`VehicleSink`]
//! 5. force feedback
//!
//! and returns a [`ControlSnapshot`]. Adapter failures are logged and the
//! affected source is skipped for the tick; nothing here panics or propagates.

use crate::arbiter::{dispatch, InputArbiter, TickInputs};
use crate::backends::DeviceRegistry;
use crate::change_log::ChangeLogger;
use crate::config::RigConfig;
use crate::error::InputError;
use crate::event::NormalizedInput;
use crate::force_feedback::ForceFeedbackDriver;
use crate::frame::RawFrame;
use crate::keyboard::KeyboardAdapter;
use crate::mouse_look::{LookAngles, MouseLook};
use crate::normalize::{normalize_serial, normalize_wheel, parse_serial_line};
use crate::sink::VehicleSink;
use crate::snapshot::ControlSnapshot;
use tracing::{debug, error, info, warn};

/// Outcome of polling the wheel for one tick.
enum WheelRead {
    Fresh(NormalizedInput),
    /// Still connected, but no usable frame this tick.
    Skipped,
    Absent,
}

pub struct RigManager {
    config: RigConfig,
    registry: DeviceRegistry,
    keyboard: KeyboardAdapter,
    mouse: MouseLook,
    arbiter: InputArbiter,
    force: ForceFeedbackDriver,
    change_log: Option<ChangeLogger>,
    ticks: u64,
    wheel_connected: bool,
    /// Report-once latches, cleared when the condition ends.
    wheel_outage_reported: bool,
    serial_malformed_reported: bool,
    sink_missing_reported: bool,
    closed: bool,
}

impl RigManager {
    /// Session over an already-built registry (virtual devices, custom adapters).
    pub fn new(config: RigConfig, registry: DeviceRegistry) -> Self {
        Self {
            keyboard: KeyboardAdapter::new(),
            mouse: MouseLook::new(&config.mouse),
            arbiter: InputArbiter::new(config.keyboard.can_override_wheel),
            force: ForceFeedbackDriver::new(&config.force_feedback),
            change_log: config.wheel.log_updates.then(ChangeLogger::new),
            ticks: 0,
            wheel_connected: false,
            wheel_outage_reported: false,
            serial_malformed_reported: false,
            sink_missing_reported: false,
            closed: false,
            config,
            registry,
        }
    }

    /// Session over the hardware adapters `config` enables.
    pub fn from_config(config: RigConfig) -> Self {
        let registry = DeviceRegistry::from_config(&config);
        Self::new(config, registry)
    }

    pub fn config(&self) -> &RigConfig {
        &self.config
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn arbiter(&self) -> &InputArbiter {
        &self.arbiter
    }

    /// Where the host pushes keyboard state between ticks.
    pub fn keyboard_mut(&mut self) -> &mut KeyboardAdapter {
        &mut self.keyboard
    }

    /// Apply one frame of mouse motion to the look angles.
    pub fn mouse_look(&mut self, dx: f32, dy: f32) -> LookAngles {
        self.mouse.apply(dx, dy)
    }

    pub fn recenter_look(&mut self) {
        self.mouse.recenter();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Run one frame. `sink` may be absent (vehicle not spawned yet); control
    /// writes are then skipped and reported, while devices and force feedback
    /// keep running.
    pub fn tick(&mut self, sink: Option<&mut dyn VehicleSink>) -> ControlSnapshot {
        if self.closed {
            debug!("tick after shutdown ignored");
            return ControlSnapshot::default();
        }
        self.ticks += 1;

        let (wheel, wheel_skipped) = match self.poll_wheel() {
            WheelRead::Fresh(input) => (Some(input), false),
            WheelRead::Skipped => (None, true),
            WheelRead::Absent => (None, false),
        };
        let serial = self.poll_serial();
        let keys = self.keyboard.take_tick();

        let serial_connected = self.serial_connected();
        let (autopilot, vehicle_speed) = match sink.as_deref() {
            Some(s) => (s.autopilot_active(), s.vehicle_speed()),
            None => (false, 0.0),
        };

        let resolution = self.arbiter.resolve(TickInputs {
            wheel: wheel.as_ref(),
            wheel_skipped,
            serial: serial.as_ref(),
            keyboard: &keys,
            hardware_connected: self.wheel_connected || serial_connected,
            autopilot,
        });

        let dispatched = match dispatch(&resolution, sink) {
            Ok(()) => {
                if std::mem::take(&mut self.sink_missing_reported) {
                    info!("vehicle sink available again");
                }
                true
            }
            Err(e) => {
                if self.sink_missing_reported {
                    debug!("{e}, skipping dispatch");
                } else {
                    error!("{e}, skipping dispatch");
                    self.sink_missing_reported = true;
                }
                false
            }
        };

        let force = self.force.apply(self.registry.wheel_mut(), vehicle_speed);

        ControlSnapshot {
            wheel_connected: self.wheel_connected,
            serial_connected,
            force,
            look: self.mouse.angles(),
            dispatched,
            ..ControlSnapshot::from_resolution(self.ticks, &resolution)
        }
    }

    /// Disconnect every adapter and close the session.
    ///
    /// `shutdown_module` also tears down the hardware driver; pass `true` only
    /// at process exit. Later ticks are no-ops, and a second call does nothing.
    pub fn shutdown(&mut self, shutdown_module: bool) {
        if self.closed {
            return;
        }
        self.registry.disconnect_all(shutdown_module);
        self.wheel_connected = false;
        self.closed = true;
        info!(shutdown_module, ticks = self.ticks, "rig session closed");
    }

    fn serial_connected(&self) -> bool {
        self.registry
            .serial()
            .is_some_and(|s| s.connection_status().connected)
    }

    fn poll_wheel(&mut self) -> WheelRead {
        let Some(wheel) = self.registry.wheel_mut() else {
            return WheelRead::Absent;
        };

        if !wheel.connection_status().connected {
            if let Err(e) = wheel.try_connect() {
                if self.wheel_outage_reported {
                    debug!("{e}");
                } else {
                    warn!("steering wheel is not connected: {e}");
                    self.wheel_outage_reported = true;
                }
            }
        }

        let connected = wheel.connection_status().connected;
        if connected && !self.wheel_connected {
            info!(wheel = %wheel.metadata(), "wheel connected, waiting for first input");
            self.arbiter.rearm_defaulting();
            self.wheel_outage_reported = false;
        }
        self.wheel_connected = connected;
        if !connected {
            return WheelRead::Absent;
        }

        let frame = match wheel.poll() {
            Ok(Some(RawFrame::Wheel(frame))) => frame,
            Ok(Some(other)) => {
                debug!(?other, "wheel adapter produced a non-wheel frame");
                return WheelRead::Skipped;
            }
            Ok(None) => return WheelRead::Skipped,
            Err(e) if e.is_disconnect() => {
                info!("{e}");
                self.wheel_connected = false;
                return WheelRead::Absent;
            }
            Err(e) => {
                warn!("{e}, skipping wheel this tick");
                return WheelRead::Skipped;
            }
        };

        if let Some(log) = self.change_log.as_mut() {
            log.observe(&frame);
        }
        WheelRead::Fresh(normalize_wheel(&frame))
    }

    fn poll_serial(&mut self) -> Option<NormalizedInput> {
        let serial = self.registry.serial_mut()?;
        if !serial.connection_status().connected {
            return None;
        }

        let line = match serial.poll() {
            Ok(Some(RawFrame::Serial(line))) => line,
            Ok(Some(other)) => {
                debug!(?other, "serial adapter produced a non-serial frame");
                return None;
            }
            Ok(None) => return None,
            Err(e) if e.is_disconnect() => {
                debug!("{e}");
                return None;
            }
            Err(e) => {
                warn!("{e}, skipping serial this tick");
                return None;
            }
        };

        let parsed = parse_serial_line(&line);
        if parsed.is_clean() {
            self.serial_malformed_reported = false;
        } else {
            let e = InputError::MalformedFrame {
                device: serial.name().to_string(),
                reason: format!("{} read as 0 in {line:?}", parsed.malformed.join(", ")),
            };
            if self.serial_malformed_reported {
                debug!("{e}");
            } else {
                warn!("{e}");
                self.serial_malformed_reported = true;
            }
        }
        Some(normalize_serial(parsed.reading))
    }
}

impl Drop for RigManager {
    fn drop(&mut self) {
        if !self.closed {
            self.shutdown(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::ArbiterPhase;
    use crate::backends::virtual_input::{ForceCall, VirtualWheel};
    use crate::event::ControlSource;
    use crate::force_feedback::ForceAction;

    fn session(wheel: &VirtualWheel) -> RigManager {
        RigManager::new(
            RigConfig::default(),
            DeviceRegistry::new().with_wheel(wheel.clone()),
        )
    }

    #[test]
    fn first_tick_connects_and_defaults() {
        let wheel = VirtualWheel::new(true);
        let mut rig = session(&wheel);
        let snap = rig.tick(None);
        assert_eq!(snap.tick, 1);
        assert!(snap.wheel_connected);
        assert_eq!(snap.phase, ArbiterPhase::Defaulting);
        assert_eq!(snap.source, ControlSource::None);
        assert!(!snap.dispatched);
        assert!(matches!(snap.force, ForceAction::Spring(_)));
        assert_eq!(wheel.connect_attempts(), 1);
    }

    #[test]
    fn reconnect_is_attempted_every_tick_while_absent() {
        let wheel = VirtualWheel::new(true);
        wheel.unplug();
        let mut rig = session(&wheel);
        for _ in 0..3 {
            let snap = rig.tick(None);
            assert!(!snap.wheel_connected);
            assert_eq!(snap.force, ForceAction::Stop);
        }
        assert_eq!(wheel.connect_attempts(), 3);
    }

    #[test]
    fn no_adapters_still_ticks() {
        let mut rig = RigManager::new(RigConfig::default(), DeviceRegistry::new());
        let snap = rig.tick(None);
        assert_eq!(snap.force, ForceAction::Idle);
        assert!(!snap.wheel_connected);
        assert!(!snap.serial_connected);
    }

    #[test]
    fn shutdown_stops_force_and_closes() {
        let wheel = VirtualWheel::new(true);
        let mut rig = session(&wheel);
        rig.tick(None);
        rig.shutdown(true);
        assert!(rig.is_closed());
        assert!(wheel.is_shut_down());
        assert_eq!(wheel.last_force(), Some(ForceCall::Stop));

        wheel.clear_forces();
        let snap = rig.tick(None);
        assert_eq!(snap, ControlSnapshot::default());
        assert!(wheel.forces().is_empty());
        rig.shutdown(true);
    }

    #[test]
    fn mouse_look_is_reported() {
        let mut rig = RigManager::new(RigConfig::default(), DeviceRegistry::new());
        rig.mouse_look(10.0, 0.0);
        assert!((rig.tick(None).look.yaw - 10.0).abs() < f32::EPSILON);
        rig.recenter_look();
        assert_eq!(rig.tick(None).look, LookAngles::default());
    }
}
