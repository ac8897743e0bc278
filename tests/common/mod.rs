#![allow(dead_code)]

use wheelup::backends::serial_port::SerialAdapter;
use wheelup::backends::virtual_input::{VirtualSerial, VirtualWheel};
use wheelup::{CameraPan, DeviceRegistry, RigConfig, RigManager, VehicleSink};

/// Vehicle stand-in that records every call.
///
/// Press/release calls are tracked as levels, so a repeated press is a no-op
/// and `*_engaged` counts only real off-to-on transitions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub steering: Vec<f32>,
    pub throttle: Vec<f32>,
    pub brake: Vec<f32>,
    pub reverse: bool,
    pub reverse_engaged: u32,
    pub reverse_calls: u32,
    pub turn_left: bool,
    pub turn_right: bool,
    pub handbrake: bool,
    pub nudges: Vec<CameraPan>,
    pub next_views: u32,
    pub prev_views: u32,
    pub autopilot: bool,
    pub speed: f32,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis_writes(&self) -> usize {
        self.steering.len() + self.throttle.len() + self.brake.len()
    }

    pub fn last_steering(&self) -> Option<f32> {
        self.steering.last().copied()
    }

    pub fn last_throttle(&self) -> Option<f32> {
        self.throttle.last().copied()
    }

    pub fn last_brake(&self) -> Option<f32> {
        self.brake.last().copied()
    }
}

impl VehicleSink for RecordingSink {
    fn set_steering(&mut self, value: f32) {
        self.steering.push(value);
    }
    fn set_throttle(&mut self, value: f32) {
        self.throttle.push(value);
    }
    fn set_brake(&mut self, value: f32) {
        self.brake.push(value);
    }

    fn press_reverse(&mut self) {
        self.reverse_calls += 1;
        if !self.reverse {
            self.reverse = true;
            self.reverse_engaged += 1;
        }
    }
    fn release_reverse(&mut self) {
        self.reverse = false;
    }
    fn press_turn_signal_left(&mut self) {
        self.turn_left = true;
    }
    fn release_turn_signal_left(&mut self) {
        self.turn_left = false;
    }
    fn press_turn_signal_right(&mut self) {
        self.turn_right = true;
    }
    fn release_turn_signal_right(&mut self) {
        self.turn_right = false;
    }
    fn press_handbrake(&mut self) {
        self.handbrake = true;
    }
    fn release_handbrake(&mut self) {
        self.handbrake = false;
    }

    fn camera_nudge(&mut self, direction: CameraPan) {
        self.nudges.push(direction);
    }
    fn next_camera_view(&mut self) {
        self.next_views += 1;
    }
    fn prev_camera_view(&mut self) {
        self.prev_views += 1;
    }

    fn autopilot_active(&self) -> bool {
        self.autopilot
    }
    fn vehicle_speed(&self) -> f32 {
        self.speed
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Raw pedal reading for a normalized travel in `[0, 1]`.
pub fn pedal_raw(travel: f32) -> i32 {
    (32767.0 - travel * 65535.0).round() as i32
}

/// Raw steering reading for a normalized position in `[-1, 1]`.
pub fn steering_raw(position: f32) -> i32 {
    (position * 32767.0).round() as i32
}

pub fn approx(a: Option<f32>, b: f32) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-3)
}

pub fn wheel_rig(config: RigConfig) -> (RigManager, VirtualWheel) {
    init_tracing();
    let wheel = VirtualWheel::new(true);
    let rig = RigManager::new(config, DeviceRegistry::new().with_wheel(wheel.clone()));
    (rig, wheel)
}

pub fn serial_rig(config: RigConfig) -> (RigManager, VirtualSerial) {
    init_tracing();
    let link = VirtualSerial::new();
    let adapter = SerialAdapter::with_link("virtual0", 9600, Box::new(link.clone()));
    let rig = RigManager::new(config, DeviceRegistry::new().with_serial(adapter));
    (rig, link)
}

/// Tick until the arbiter has seen the wheel move, leaving it steered to `position`.
pub fn activate(rig: &mut RigManager, wheel: &VirtualWheel, sink: &mut RecordingSink, position: f32) {
    rig.tick(Some(&mut *sink));
    wheel.set_axes(steering_raw(position), 32767, 32767);
    rig.tick(Some(&mut *sink));
}
