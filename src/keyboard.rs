//! Keyboard adapter.
//!
//! The host owns the window and its event loop, so it pushes keyboard state in
//! rather than the adapter polling an OS API:
//!
//! - **Axes** ([`KeyAxis`]) must be re-asserted every frame while the key is down,
//!   the way engines report bound axes. [`KeyboardAdapter::take_tick`] clears them,
//!   so a released key reads `0.0` on the very next tick.
//! - **Held actions** ([`KeyAction`] reverse, turn signals, handbrake) follow
//!   press/release edges and stay held in between.
//! - **One-shot actions** (camera nudges, camera view cycling) are queued and
//!   drained once.

use crate::event::{CameraPan, DigitalEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAxis {
    Steering,
    Throttle,
    Brake,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAction {
    Reverse,
    TurnSignalLeft,
    TurnSignalRight,
    Handbrake,
    NextCameraView,
    PrevCameraView,
    Camera(CameraPan),
}

/// Camera view cycling request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraViewStep {
    Next,
    Prev,
}

/// What the keyboard contributed on one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyboardInput {
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    /// Held levels (reverse, turn signals, handbrake).
    pub held: BTreeSet<DigitalEvent>,
    pub camera_nudges: Vec<CameraPan>,
    pub view_steps: Vec<CameraViewStep>,
}

impl KeyboardInput {
    /// Any non-zero analog axis this tick.
    pub fn drives_axes(&self) -> bool {
        self.steering != 0.0 || self.throttle != 0.0 || self.brake != 0.0
    }
}

#[derive(Debug, Default)]
pub struct KeyboardAdapter {
    steering: f32,
    throttle: f32,
    brake: f32,
    held: BTreeSet<DigitalEvent>,
    camera_nudges: Vec<CameraPan>,
    view_steps: Vec<CameraViewStep>,
}

impl KeyboardAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an axis value for the current frame. Clamped to the axis range.
    pub fn set_axis(&mut self, axis: KeyAxis, value: f32) {
        let value = if value.is_finite() { value } else { 0.0 };
        match axis {
            KeyAxis::Steering => self.steering = value.clamp(-1.0, 1.0),
            KeyAxis::Throttle => self.throttle = value.clamp(0.0, 1.0),
            KeyAxis::Brake => self.brake = value.clamp(0.0, 1.0),
        }
    }

    pub fn press(&mut self, action: KeyAction) {
        match action {
            KeyAction::Camera(dir) => self.camera_nudges.push(dir),
            KeyAction::NextCameraView => self.view_steps.push(CameraViewStep::Next),
            KeyAction::PrevCameraView => self.view_steps.push(CameraViewStep::Prev),
            held => {
                if let Some(event) = held_event(held) {
                    self.held.insert(event);
                }
            }
        }
    }

    /// Release edge. One-shot actions ignore it.
    pub fn release(&mut self, action: KeyAction) {
        if let Some(event) = held_event(action) {
            self.held.remove(&event);
        }
    }

    /// Snapshot this tick's input and reset per-frame state.
    pub fn take_tick(&mut self) -> KeyboardInput {
        KeyboardInput {
            steering: std::mem::take(&mut self.steering),
            throttle: std::mem::take(&mut self.throttle),
            brake: std::mem::take(&mut self.brake),
            held: self.held.clone(),
            camera_nudges: std::mem::take(&mut self.camera_nudges),
            view_steps: std::mem::take(&mut self.view_steps),
        }
    }
}

fn held_event(action: KeyAction) -> Option<DigitalEvent> {
    match action {
        KeyAction::Reverse => Some(DigitalEvent::ReverseHeld),
        KeyAction::TurnSignalLeft => Some(DigitalEvent::TurnSignalLeft),
        KeyAction::TurnSignalRight => Some(DigitalEvent::TurnSignalRight),
        KeyAction::Handbrake => Some(DigitalEvent::HandbrakeHeld),
        KeyAction::NextCameraView | KeyAction::PrevCameraView | KeyAction::Camera(_) => None,
    }
}
