//! The vehicle the arbiter drives.

use crate::event::CameraPan;

/// Receiver of the arbiter's resolved controls.
///
/// Press/release calls are level assertions made every tick; implementations
/// must treat a repeated press (or release) as a no-op.
pub trait VehicleSink {
    /// `[-1, 1]`, negative = left.
    fn set_steering(&mut self, value: f32);
    /// `[0, 1]`.
    fn set_throttle(&mut self, value: f32);
    /// `[0, 1]`.
    fn set_brake(&mut self, value: f32);

    fn press_reverse(&mut self);
    fn release_reverse(&mut self);
    fn press_turn_signal_left(&mut self);
    fn release_turn_signal_left(&mut self);
    fn press_turn_signal_right(&mut self);
    fn release_turn_signal_right(&mut self);
    fn press_handbrake(&mut self);
    fn release_handbrake(&mut self);

    fn camera_nudge(&mut self, direction: CameraPan);
    fn next_camera_view(&mut self);
    fn prev_camera_view(&mut self);

    /// `true` while an AI controller is driving.
    fn autopilot_active(&self) -> bool;

    /// Current speed in m/s. Not used by the centering spring.
    fn vehicle_speed(&self) -> f32;
}
