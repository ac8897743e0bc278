//! Input arbitration and force feedback for driving-simulator rigs.
//!
//! A [`RigManager`] owns a force-feedback wheel, an optional serial pedal board,
//! and keyboard/mouse state pushed in by the host. Each frame the host calls
//! [`RigManager::tick`] with its [`VehicleSink`]; the manager decides which
//! source drives the vehicle, writes the controls, and keeps the wheel's
//! centering spring in step with the device state.
//!
//! ```no_run
//! use wheelup::{RigConfig, RigManager, VehicleSink};
//!
//! fn frame(rig: &mut RigManager, car: &mut dyn VehicleSink) {
//!     let snap = rig.tick(Some(car));
//!     if !snap.wheel_connected {
//!         // show a "plug in your wheel" hint
//!     }
//! }
//!
//! let rig = RigManager::from_config(RigConfig::default());
//! # drop(rig);
//! ```

pub mod arbiter;
pub mod backends;
pub mod change_log;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod force_feedback;
pub mod frame;
pub mod keyboard;
pub mod manager;
pub mod metadata;
pub mod mouse_look;
pub mod normalize;
pub mod sink;
pub mod snapshot;

pub use arbiter::{ArbiterPhase, ArbiterState, InputArbiter};
pub use backends::{Capabilities, DeviceRegistry};
pub use config::*;
pub use device::*;
pub use error::{InputError, InputResult};
pub use event::*;
pub use force_feedback::{ForceAction, ForceFeedbackDriver};
pub use keyboard::{KeyAction, KeyAxis, KeyboardAdapter};
pub use manager::RigManager;
pub use mouse_look::LookAngles;
pub use sink::VehicleSink;
pub use snapshot::ControlSnapshot;
