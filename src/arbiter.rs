//! Input arbiter: decides which source owns the vehicle each tick.
//!
//! # States
//! - [`ArbiterPhase::Defaulting`]: the wheel has not been touched since it
//!   connected. Wheel drivers report placeholder pedal values until the first
//!   input, so nothing from the wheel is dispatched.
//! - [`ArbiterPhase::Active`]: normal arbitration. Entered the first time any
//!   wheel axis leaves its rest value by more than [`ANALOG_THRESHOLD`]; only a
//!   wheel reconnect goes back.
//!
//! # Precedence (one source per tick)
//! 1. Keyboard, whenever any keyboard axis is non-zero (and the keyboard may
//!    override hardware, or no hardware is live).
//! 2. Wheel, when active and either autopilot is off or the driver moved an
//!    axis by more than the threshold since the previous tick.
//! 3. Serial board, whenever it delivered a frame.
//! 4. Autopilot keeps control otherwise.
//!
//! Digital levels (reverse, turn signals, handbrake) are asserted every tick as
//! the OR of wheel buttons and held keys, independent of who owns the axes. A
//! tick whose wheel read was skipped reuses the wheel's last levels; only a
//! missing wheel releases them.

use crate::event::{CameraPan, ControlSource, DigitalEvent, NormalizedInput};
use crate::error::{InputError, InputResult};
use crate::keyboard::{CameraViewStep, KeyboardInput};
use crate::normalize::{nearly_equal, ANALOG_THRESHOLD};
use crate::sink::VehicleSink;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Placeholder pedal value wheel drivers report before the first input.
pub const DEFAULTING_PEDAL: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArbiterPhase {
    #[default]
    Defaulting,
    Active,
}

/// Cross-tick arbiter memory. One per vehicle session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArbiterState {
    /// Wheel values from the previous tick, for the autopilot-yield check.
    pub last_steering: f32,
    pub last_throttle: f32,
    pub last_brake: f32,
    pub pedals_defaulting: bool,
    /// Set only on ticks where the keyboard claimed the axes.
    pub keyboard_override_active: bool,
    /// Source that owned the axes on the most recent tick.
    pub connected_source: ControlSource,
    /// Held wheel levels from the last successful read. Camera pans are not kept.
    pub wheel_levels: BTreeSet<DigitalEvent>,
}

impl Default for ArbiterState {
    fn default() -> Self {
        Self {
            last_steering: 0.0,
            last_throttle: 0.0,
            last_brake: 0.0,
            pedals_defaulting: true,
            keyboard_override_active: false,
            connected_source: ControlSource::None,
            wheel_levels: BTreeSet::new(),
        }
    }
}

/// Everything the arbiter looks at for one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickInputs<'a> {
    /// Normalized wheel reading, if the wheel produced a frame this tick.
    pub wheel: Option<&'a NormalizedInput>,
    /// The wheel is connected but produced no reading this tick (read failure).
    pub wheel_skipped: bool,
    /// Normalized serial reading, if a new line arrived this tick.
    pub serial: Option<&'a NormalizedInput>,
    pub keyboard: &'a KeyboardInput,
    /// Any hardware source (wheel or serial) is connected.
    pub hardware_connected: bool,
    pub autopilot: bool,
}

/// Commands the arbiter wants sent to the vehicle this tick.
///
/// `None` analog fields are left untouched on the sink.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub source: ControlSource,
    pub phase: ArbiterPhase,
    pub steering: Option<f32>,
    pub throttle: Option<f32>,
    pub brake: Option<f32>,
    pub reverse: bool,
    pub turn_signal_left: bool,
    pub turn_signal_right: bool,
    pub handbrake: bool,
    pub camera_nudges: Vec<CameraPan>,
    pub view_steps: Vec<CameraViewStep>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WheelVerdict {
    Absent,
    Defaulting,
    YieldToAutopilot,
    Claim,
}

#[derive(Debug)]
pub struct InputArbiter {
    state: ArbiterState,
    keyboard_can_override: bool,
}

impl InputArbiter {
    pub fn new(keyboard_can_override: bool) -> Self {
        Self {
            state: ArbiterState::default(),
            keyboard_can_override,
        }
    }

    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    pub fn phase(&self) -> ArbiterPhase {
        if self.state.pedals_defaulting {
            ArbiterPhase::Defaulting
        } else {
            ArbiterPhase::Active
        }
    }

    /// Go back to `Defaulting`. Call when the wheel (re)connects.
    pub fn rearm_defaulting(&mut self) {
        if !self.state.pedals_defaulting {
            debug!("wheel reconnected, waiting for first input again");
        }
        self.state.pedals_defaulting = true;
    }

    /// Decide this tick's commands and update cross-tick state.
    pub fn resolve(&mut self, inputs: TickInputs<'_>) -> Resolution {
        let kb = inputs.keyboard;
        let verdict = match inputs.wheel {
            Some(wheel) => self.evaluate_wheel(wheel, inputs.autopilot),
            None => WheelVerdict::Absent,
        };

        let keyboard_claims =
            kb.drives_axes() && (self.keyboard_can_override || !inputs.hardware_connected);
        let previous_source = self.state.connected_source;

        let mut out = Resolution::default();
        if keyboard_claims {
            out.source = ControlSource::Keyboard;
            // steering snaps to zero when its key is up; pedals are only sent while pressed
            out.steering = Some(kb.steering);
            out.throttle = (kb.throttle != 0.0).then_some(kb.throttle);
            out.brake = (kb.brake != 0.0).then_some(kb.brake);
        } else if let (WheelVerdict::Claim, Some(wheel)) = (verdict, inputs.wheel) {
            out.source = ControlSource::Wheel;
            set_analog(&mut out, wheel);
        } else if let Some(serial) = inputs.serial {
            out.source = ControlSource::Serial;
            set_analog(&mut out, serial);
        } else if verdict == WheelVerdict::YieldToAutopilot || inputs.autopilot {
            out.source = ControlSource::Autopilot;
        }

        if previous_source == ControlSource::Keyboard
            && out.steering.is_none()
            && out.source != ControlSource::Autopilot
        {
            out.steering = Some(0.0);
        }

        match inputs.wheel {
            Some(w) => {
                self.state.wheel_levels = w
                    .digital
                    .iter()
                    .copied()
                    .filter(|e| !matches!(e, DigitalEvent::CameraPan(_)))
                    .collect();
            }
            None if inputs.wheel_skipped => {}
            None => self.state.wheel_levels.clear(),
        }

        let wheel_held = |e: DigitalEvent| self.state.wheel_levels.contains(&e);
        let key_held = |e: DigitalEvent| kb.held.contains(&e);
        let held = |e: DigitalEvent| wheel_held(e) || key_held(e);
        out.reverse = held(DigitalEvent::ReverseHeld);
        out.turn_signal_left = held(DigitalEvent::TurnSignalLeft);
        out.turn_signal_right = held(DigitalEvent::TurnSignalRight);
        out.handbrake = held(DigitalEvent::HandbrakeHeld);

        if let Some(pan) = inputs.wheel.and_then(NormalizedInput::camera_pan) {
            out.camera_nudges.push(pan);
        }
        out.camera_nudges.extend(kb.camera_nudges.iter().copied());
        out.view_steps.extend(kb.view_steps.iter().copied());

        self.state.keyboard_override_active = keyboard_claims;
        self.state.connected_source = out.source;
        out.phase = self.phase();
        out
    }

    fn evaluate_wheel(&mut self, wheel: &NormalizedInput, autopilot: bool) -> WheelVerdict {
        let s = &mut self.state;
        let verdict = if s.pedals_defaulting {
            if !wheel_at_rest(wheel) {
                s.pedals_defaulting = false;
                debug!("wheel touched, arbitration active");
            }
            WheelVerdict::Defaulting
        } else {
            let unchanged = nearly_equal(wheel.steering, s.last_steering, ANALOG_THRESHOLD)
                && nearly_equal(wheel.throttle, s.last_throttle, ANALOG_THRESHOLD)
                && nearly_equal(wheel.brake, s.last_brake, ANALOG_THRESHOLD);
            if autopilot && unchanged {
                WheelVerdict::YieldToAutopilot
            } else {
                WheelVerdict::Claim
            }
        };
        s.last_steering = wheel.steering;
        s.last_throttle = wheel.throttle;
        s.last_brake = wheel.brake;
        verdict
    }
}

/// A pedal is at rest when released or still showing the driver placeholder.
fn pedal_at_rest(v: f32) -> bool {
    nearly_equal(v, 0.0, ANALOG_THRESHOLD) || nearly_equal(v, DEFAULTING_PEDAL, ANALOG_THRESHOLD)
}

fn wheel_at_rest(w: &NormalizedInput) -> bool {
    nearly_equal(w.steering, 0.0, ANALOG_THRESHOLD)
        && pedal_at_rest(w.throttle)
        && pedal_at_rest(w.brake)
}

fn set_analog(out: &mut Resolution, input: &NormalizedInput) {
    out.steering = Some(input.steering);
    out.throttle = Some(input.throttle);
    out.brake = Some(input.brake);
}

/// Send a resolution to the vehicle.
///
/// With no sink every write is skipped and `MissingCollaborator` is returned
/// for the caller to log.
pub fn dispatch<'s>(
    resolution: &Resolution,
    sink: Option<&mut (dyn VehicleSink + 's)>,
) -> InputResult<()> {
    let Some(sink) = sink else {
        return Err(InputError::MissingCollaborator("vehicle sink"));
    };

    if let Some(v) = resolution.steering {
        sink.set_steering(v);
    }
    if let Some(v) = resolution.throttle {
        sink.set_throttle(v);
    }
    if let Some(v) = resolution.brake {
        sink.set_brake(v);
    }

    if resolution.reverse {
        sink.press_reverse();
    } else {
        sink.release_reverse();
    }
    if resolution.turn_signal_right {
        sink.press_turn_signal_right();
    } else {
        sink.release_turn_signal_right();
    }
    if resolution.turn_signal_left {
        sink.press_turn_signal_left();
    } else {
        sink.release_turn_signal_left();
    }
    if resolution.handbrake {
        sink.press_handbrake();
    } else {
        sink.release_handbrake();
    }

    for &dir in &resolution.camera_nudges {
        sink.camera_nudge(dir);
    }
    for step in &resolution.view_steps {
        match step {
            CameraViewStep::Next => sink.next_camera_view(),
            CameraViewStep::Prev => sink.prev_camera_view(),
        }
    }
    Ok(())
}
