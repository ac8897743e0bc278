//! Per-tick control snapshot.
//!
//! [`ControlSnapshot`] is an **owned**, read-only report of what one
//! [`RigManager::tick`](crate::manager::RigManager::tick) resolved: who owned
//! the axes, the values sent, the force command issued, and device liveness.
//! Hosts use it for HUDs and telemetry; it carries no handles and is cheap to
//! clone or serialize.
//!
//! # Examples
//! ```no_run
//! use wheelup::{ControlSnapshot, ControlSource};
//!
//! fn hud_line(snap: &ControlSnapshot) -> String {
//!     match snap.source {
//!         ControlSource::None => "idle".to_string(),
//!         src => format!("{src:?}: steer {:+.2}", snap.steering.unwrap_or(0.0)),
//!     }
//! }
//! ```

use crate::arbiter::{ArbiterPhase, Resolution};
use crate::event::ControlSource;
use crate::force_feedback::ForceAction;
use crate::mouse_look::LookAngles;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    /// Tick counter, starting at 1 for the first tick of a session.
    pub tick: u64,
    pub source: ControlSource,
    pub phase: ArbiterPhase,
    /// Values sent to the sink this tick; `None` where nothing was written.
    pub steering: Option<f32>,
    pub throttle: Option<f32>,
    pub brake: Option<f32>,
    pub reverse: bool,
    pub turn_signal_left: bool,
    pub turn_signal_right: bool,
    pub handbrake: bool,
    pub keyboard_override: bool,
    pub wheel_connected: bool,
    pub serial_connected: bool,
    pub force: ForceAction,
    pub look: LookAngles,
    /// `false` when the sink was absent and nothing was written.
    pub dispatched: bool,
}

impl ControlSnapshot {
    pub(crate) fn from_resolution(tick: u64, resolution: &Resolution) -> Self {
        Self {
            tick,
            source: resolution.source,
            phase: resolution.phase,
            steering: resolution.steering,
            throttle: resolution.throttle,
            brake: resolution.brake,
            reverse: resolution.reverse,
            turn_signal_left: resolution.turn_signal_left,
            turn_signal_right: resolution.turn_signal_right,
            handbrake: resolution.handbrake,
            keyboard_override: resolution.source == ControlSource::Keyboard,
            ..Self::default()
        }
    }

    /// Whether any analog value was written this tick.
    #[inline]
    pub fn wrote_axes(&self) -> bool {
        self.steering.is_some() || self.throttle.is_some() || self.brake.is_some()
    }
}
