//! Force feedback driver.
//!
//! Every tick the wheel gets exactly one of two commands: a centering spring
//! when it is connected and force-capable, or an explicit stop otherwise, so a
//! spring never outlives the device state that justified it.
//!
//! The spring is constant. Vehicle speed is passed in so speed- or
//! collision-keyed effects can be added here without touching the tick loop.

use crate::config::ForceFeedbackConfig;
use crate::device::{ForceFeedbackCommand, WheelDevice};
use serde::{Deserialize, Serialize};

/// What the driver did on a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceAction {
    /// No wheel adapter in this session.
    #[default]
    Idle,
    Spring(ForceFeedbackCommand),
    Stop,
}

#[derive(Clone, Debug)]
pub struct ForceFeedbackDriver {
    spring: ForceFeedbackCommand,
}

impl ForceFeedbackDriver {
    pub fn new(config: &ForceFeedbackConfig) -> Self {
        Self {
            spring: ForceFeedbackCommand::spring(
                config.offset_percent,
                config.saturation_percent,
                config.coefficient_percent,
            ),
        }
    }

    /// The command a connected, force-capable wheel receives.
    pub fn compute(&self, _vehicle_speed: f32) -> ForceFeedbackCommand {
        self.spring
    }

    pub fn apply<'w>(
        &self,
        wheel: Option<&mut (dyn WheelDevice + 'w)>,
        vehicle_speed: f32,
    ) -> ForceAction {
        let Some(wheel) = wheel else {
            return ForceAction::Idle;
        };
        if wheel.connection_status().connected && wheel.has_force_feedback() {
            let command = self.compute(vehicle_speed);
            wheel.issue_force(command);
            ForceAction::Spring(command)
        } else {
            wheel.stop_force();
            ForceAction::Stop
        }
    }
}

impl Default for ForceFeedbackDriver {
    fn default() -> Self {
        Self::new(&ForceFeedbackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{ForceCall, VirtualWheel};

    #[test]
    fn connected_ffb_wheel_gets_default_spring() -> Result<(), Box<dyn std::error::Error>> {
        let handle = VirtualWheel::new(true);
        let mut wheel = handle.clone();
        wheel.try_connect()?;
        let driver = ForceFeedbackDriver::default();
        let action = driver.apply(Some(&mut wheel), 12.0);
        let expected = ForceFeedbackCommand::spring(0, 30, 100);
        assert_eq!(action, ForceAction::Spring(expected));
        assert_eq!(handle.last_force(), Some(ForceCall::Spring(expected)));
        Ok(())
    }

    #[test]
    fn wheel_without_ffb_gets_stop() -> Result<(), Box<dyn std::error::Error>> {
        let handle = VirtualWheel::new(false);
        let mut wheel = handle.clone();
        wheel.try_connect()?;
        let action = ForceFeedbackDriver::default().apply(Some(&mut wheel), 0.0);
        assert_eq!(action, ForceAction::Stop);
        assert_eq!(handle.forces(), vec![ForceCall::Stop]);
        Ok(())
    }

    #[test]
    fn disconnected_wheel_gets_stop() {
        let handle = VirtualWheel::new(true);
        let mut wheel = handle.clone();
        let action = ForceFeedbackDriver::default().apply(Some(&mut wheel), 0.0);
        assert_eq!(action, ForceAction::Stop);
    }

    #[test]
    fn no_wheel_is_idle() {
        assert_eq!(ForceFeedbackDriver::default().apply(None, 0.0), ForceAction::Idle);
    }

    #[test]
    fn spring_comes_from_config_and_ignores_speed() {
        let driver = ForceFeedbackDriver::new(&ForceFeedbackConfig {
            offset_percent: 5,
            saturation_percent: 150,
            coefficient_percent: 40,
        });
        let slow = driver.compute(0.0);
        assert_eq!(slow, ForceFeedbackCommand::spring(5, 100, 40));
        assert_eq!(driver.compute(60.0), slow);
    }
}
