//! Mouse look for non-VR seating.
//!
//! Rotates the driver camera by mouse deltas and clamps to a human neck's range:
//! 85 degrees of flexion (down), 70 of extension (up), 90 of rotation either side.

use crate::config::MouseConfig;
use serde::{Deserialize, Serialize};

pub const MIN_PITCH_DEG: f32 = -85.0;
pub const MAX_PITCH_DEG: f32 = 70.0;
pub const MAX_YAW_DEG: f32 = 90.0;

/// Camera rotation relative to the seat, in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    pub pitch: f32,
    pub yaw: f32,
}

#[derive(Clone, Debug)]
pub struct MouseLook {
    scale_x: f32,
    /// Negative unless inverted: mouse-up looks up.
    scale_y: f32,
    angles: LookAngles,
}

impl MouseLook {
    pub fn new(config: &MouseConfig) -> Self {
        let sign = if config.invert_y { 1.0 } else { -1.0 };
        Self {
            scale_x: config.scale_x,
            scale_y: sign * config.scale_y,
            angles: LookAngles::default(),
        }
    }

    /// Apply one frame of mouse motion. Zero deltas leave the angles untouched.
    pub fn apply(&mut self, dx: f32, dy: f32) -> LookAngles {
        if dy != 0.0 && dy.is_finite() {
            self.angles.pitch =
                (self.angles.pitch + self.scale_y * dy).clamp(MIN_PITCH_DEG, MAX_PITCH_DEG);
        }
        if dx != 0.0 && dx.is_finite() {
            self.angles.yaw = (self.angles.yaw + self.scale_x * dx).clamp(-MAX_YAW_DEG, MAX_YAW_DEG);
        }
        self.angles
    }

    pub fn angles(&self) -> LookAngles {
        self.angles
    }

    pub fn recenter(&mut self) {
        self.angles = LookAngles::default();
    }
}
