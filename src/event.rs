//! Canonical control values.
//!
//! Adapters produce raw frames; the [`normalize`](crate::normalize) module turns
//! those into a [`NormalizedInput`], which is what the arbiter reasons about.
//!
//! ## Value conventions
//! - **Steering:** `[-1.0, 1.0]`, negative = left.
//! - **Throttle / brake:** `[0.0, 1.0]`, `0.0` = released.
//! - **Digital events:** level-triggered; presence in the set means "held this tick".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Direction of a camera nudge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CameraPan {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Digital input asserted by a source during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DigitalEvent {
    ReverseHeld,
    TurnSignalLeft,
    TurnSignalRight,
    HandbrakeHeld,
    CameraPan(CameraPan),
}

/// One source's canonical reading for one tick.
///
/// Produced fresh every tick and never mutated afterwards, only superseded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub steering: f32,
    pub throttle: f32,
    pub brake: f32,
    pub digital: BTreeSet<DigitalEvent>,
}

impl NormalizedInput {
    pub fn analog(steering: f32, throttle: f32, brake: f32) -> Self {
        Self {
            steering,
            throttle,
            brake,
            digital: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn is_held(&self, event: DigitalEvent) -> bool {
        self.digital.contains(&event)
    }

    /// The camera pan requested this tick, if any. A source reports at most one.
    pub fn camera_pan(&self) -> Option<CameraPan> {
        self.digital.iter().find_map(|e| match e {
            DigitalEvent::CameraPan(dir) => Some(*dir),
            _ => None,
        })
    }
}

/// Which source owned the vehicle controls on a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlSource {
    #[default]
    None,
    Wheel,
    Serial,
    Keyboard,
    Autopilot,
}
