//! HID steering wheel adapter.
//!
//! [`HidWheel`] owns the process-wide `hidapi` context and at most one open wheel.
//! It is responsible for:
//! - enumerating wheel-class HID endpoints and opening the configured index
//! - draining a bounded number of input reports per poll, non-blocking
//! - translating the standard wheel input report into a [`WheelFrame`] in
//!   DirectInput units, so the normalizer sees the same ranges as a wheel SDK
//! - sending the autocenter spring / stop reports for force feedback
//!
//! ## Report layout (report ID `0x01`)
//! | Bytes | Field |
//! |---|---|
//! | 1-2 | steering, u16 LE, center `0x8000` |
//! | 3, 4, 5 | throttle, brake, clutch, `0x00` released .. `0xFF` pressed |
//! | 6-7 | buttons 0..15 bitmask |
//! | 8 (low nibble) | hat, `0..7` clockwise from up, `8` neutral |

use crate::device::{ConnectionStatus, Device, DeviceHandle, ForceFeedbackCommand, WheelDevice};
use crate::error::{InputError, InputResult};
use crate::frame::{RawFrame, WheelFrame, POV_CENTERED};
use crate::metadata::DeviceMeta;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use tracing::{debug, info, warn};

/// Maximum number of HID reports drained per `poll()` call.
const MAX_REPORTS_PER_TICK: usize = 32;

const REPORT_BUF_LEN: usize = 64;

pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// Logitech wheels that accept the autocenter spring commands.
const FFB_PRODUCT_IDS: &[u16] = &[
    0xC294, // Driving Force / G27 compat
    0xC298, // Driving Force Pro
    0xC299, // G25
    0xC29A, // Driving Force GT
    0xC29B, // G27
    0xC24F, // G29 (PS)
    0xC260, // G29 (Xbox)
    0xC261, // G920 v1
    0xC262, // G920
    0xC26D, // G923 (Xbox)
    0xC26E, // G923 (PS)
    0xC266, // G PRO
    0xC272, // PRO Racing
];

const STANDARD_INPUT_REPORT: u8 = 0x01;

/// Decide whether a `hidapi` entry looks like a wheel/pedal set.
///
/// Accepts joystick (`0x04`), gamepad (`0x05`) and multi-axis (`0x08`) on Generic
/// Desktop, plus anything on the Simulation Controls page.
fn accept_device(info: &DeviceInfo) -> bool {
    match info.usage_page() {
        0x01 => matches!(info.usage(), 0x04 | 0x05 | 0x08),
        0x02 => true,
        _ => false,
    }
}

fn meta_from_info(info: &DeviceInfo) -> DeviceMeta {
    DeviceMeta {
        bus: Some("usb".to_string()),
        vid: Some(info.vendor_id()),
        pid: Some(info.product_id()),
        product_string: info.product_string().map(str::to_string),
        serial_number: info.serial_number().map(str::to_string),
        path: Some(info.path().to_string_lossy().into_owned()),
        baud_rate: None,
    }
}

/// Convert a pedal byte (`0` released, `255` floored) to the DirectInput axis.
#[inline]
fn pedal_axis(byte: u8) -> i32 {
    32767 - (i32::from(byte) * 65535 / 255)
}

/// Decode a standard wheel input report into a frame.
///
/// Returns `None` if the report is too short or has a different report ID.
pub fn parse_wheel_report(data: &[u8]) -> Option<WheelFrame> {
    if data.len() < 9 || data[0] != STANDARD_INPUT_REPORT {
        return None;
    }
    let mut frame = WheelFrame {
        x: i32::from(u16::from_le_bytes([data[1], data[2]])) - 32768,
        y: pedal_axis(data[3]),
        rz: pedal_axis(data[4]),
        ..WheelFrame::default()
    };
    frame.sliders[0] = pedal_axis(data[5]);

    let buttons = u16::from_le_bytes([data[6], data[7]]);
    for bit in 0..16 {
        frame.set_button(bit, buttons & (1 << bit) != 0);
    }

    let hat = data[8] & 0x0F;
    frame.pov[0] = if hat < 8 {
        i32::from(hat) * 4500
    } else {
        POV_CENTERED
    };
    Some(frame)
}

/// Autocenter spring as two vendor reports (configure, then activate).
///
/// hidapi needs a leading report-ID byte; these commands go out unnumbered.
fn spring_reports(command: ForceFeedbackCommand) -> [[u8; 8]; 2] {
    // 4-bit spring constant, 8-bit strength
    let k = (command.coefficient_percent.unsigned_abs() * 15 / 100) as u8;
    let strength = (command.saturation_percent.unsigned_abs() * 255 / 100) as u8;
    [
        [0x00, 0xFE, 0x0D, k, k, strength, 0x00, 0x00],
        [0x00, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    ]
}

const STOP_AUTOCENTER: [u8; 8] = [0x00, 0xF5, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

struct OpenWheel {
    raw: HidDevice,
    meta: DeviceMeta,
    ffb: bool,
}

/// Wheel adapter backed by `hidapi`.
pub struct HidWheel {
    device_index: usize,
    name: String,
    api: Option<HidApi>,
    open: Option<OpenWheel>,
    state: WheelFrame,
    active_force: Option<ForceFeedbackCommand>,
    shut_down: bool,
}

impl HidWheel {
    pub fn new(device_index: usize) -> Self {
        Self {
            device_index,
            name: format!("wheel:{device_index}"),
            api: None,
            open: None,
            state: WheelFrame::default(),
            active_force: None,
            shut_down: false,
        }
    }

    fn not_connected(&self) -> InputError {
        InputError::DeviceNotConnected {
            device: self.name.clone(),
        }
    }

    fn guard_shutdown(&self) -> InputResult<()> {
        if self.shut_down {
            return Err(InputError::ModuleShutDown {
                device: self.name.clone(),
            });
        }
        Ok(())
    }

    fn write_reports(&mut self, reports: &[[u8; 8]]) {
        let Some(open) = &self.open else { return };
        for report in reports {
            if let Err(e) = open.raw.write(report) {
                warn!(device = %self.name, "force feedback write failed: {e}");
                return;
            }
        }
    }

    fn drop_device(&mut self, reason: &str) {
        if self.open.take().is_some() {
            info!(device = %self.name, "wheel disconnected: {reason}");
        }
        self.active_force = None;
        self.state = WheelFrame::default();
    }
}

impl Device for HidWheel {
    fn name(&self) -> &str {
        &self.name
    }

    /// Drain up to [`MAX_REPORTS_PER_TICK`] reports and return the latest state.
    fn poll(&mut self) -> InputResult<Option<RawFrame>> {
        self.guard_shutdown()?;
        let Some(open) = &self.open else {
            return Err(self.not_connected());
        };

        let mut buf = [0u8; REPORT_BUF_LEN];
        let mut failure = None;
        for _ in 0..MAX_REPORTS_PER_TICK {
            match open.raw.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if let Some(frame) = buf.get(..n).and_then(parse_wheel_report) {
                        self.state = frame;
                    }
                }
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        if let Some(reason) = failure {
            self.drop_device(&reason);
            return Err(self.not_connected());
        }
        Ok(Some(RawFrame::Wheel(Box::new(self.state.clone()))))
    }

    fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.open.is_some(),
            handle: DeviceHandle::Index(self.device_index),
        }
    }

    fn disconnect(&mut self, shutdown_module: bool) {
        if self.shut_down {
            return;
        }
        self.stop_force();
        self.drop_device("session teardown");
        if shutdown_module {
            self.api = None;
            self.shut_down = true;
            info!(device = %self.name, "HID module shut down");
        }
    }

    fn metadata(&self) -> DeviceMeta {
        self.open
            .as_ref()
            .map(|o| o.meta.clone())
            .unwrap_or_default()
    }
}

impl WheelDevice for HidWheel {
    fn try_connect(&mut self) -> InputResult<()> {
        self.guard_shutdown()?;
        if self.open.is_some() {
            return Ok(());
        }

        if let Some(api) = self.api.as_mut() {
            if let Err(e) = api.refresh_devices() {
                debug!(device = %self.name, "hid refresh failed: {e}");
            }
        } else {
            let api = HidApi::new().map_err(|e| InputError::DeviceReadFailure {
                device: self.name.clone(),
                reason: format!("hidapi init: {e}"),
            })?;
            self.api = Some(api);
        }
        let Some(api) = self.api.as_ref() else {
            return Err(self.not_connected());
        };

        let Some(info) = api
            .device_list()
            .filter(|info| accept_device(info))
            .nth(self.device_index)
        else {
            return Err(InputError::DeviceNotConnected {
                device: self.name.clone(),
            });
        };

        let raw = info
            .open_device(api)
            .map_err(|e| InputError::DeviceReadFailure {
                device: self.name.clone(),
                reason: format!("open: {e}"),
            })?;
        // Polled from the tick; never block.
        if let Err(e) = raw.set_blocking_mode(false) {
            debug!(device = %self.name, "set_blocking_mode failed: {e}");
        }

        let meta = meta_from_info(info);
        let ffb = meta.vid == Some(LOGITECH_VENDOR_ID)
            && meta.pid.is_some_and(|pid| FFB_PRODUCT_IDS.contains(&pid));
        info!(
            "Found wheel \"{}\" connected on input {} (force feedback: {})",
            meta.friendly_name(),
            self.device_index,
            ffb
        );
        self.open = Some(OpenWheel { raw, meta, ffb });
        self.state = WheelFrame::default();
        Ok(())
    }

    fn has_force_feedback(&self) -> bool {
        self.open.as_ref().is_some_and(|o| o.ffb)
    }

    fn issue_force(&mut self, command: ForceFeedbackCommand) {
        if self.shut_down || !self.has_force_feedback() {
            return;
        }
        if self.active_force == Some(command) {
            return;
        }
        if command.offset_percent != 0 {
            debug!(
                device = %self.name,
                "autocenter spring has no offset; ignoring {}%",
                command.offset_percent
            );
        }
        self.write_reports(&spring_reports(command));
        self.active_force = Some(command);
    }

    fn stop_force(&mut self) {
        if self.shut_down || self.active_force.take().is_none() {
            return;
        }
        self.write_reports(&[STOP_AUTOCENTER]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_pedal, normalize_steering};

    fn report(steer: u16, throttle: u8, brake: u8, buttons: u16, hat: u8) -> Vec<u8> {
        let s = steer.to_le_bytes();
        let b = buttons.to_le_bytes();
        vec![0x01, s[0], s[1], throttle, brake, 0x00, b[0], b[1], hat, 0x00]
    }

    #[test]
    fn center_report_is_rest() -> Result<(), Box<dyn std::error::Error>> {
        let f = parse_wheel_report(&report(0x8000, 0, 0, 0, 8)).ok_or("no frame")?;
        assert_eq!(f.x, 0);
        assert_eq!(f.y, 32767);
        assert_eq!(f.rz, 32767);
        assert_eq!(f.pov[0], POV_CENTERED);
        assert!(normalize_pedal(f.y).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn full_lock_and_floored_pedals() -> Result<(), Box<dyn std::error::Error>> {
        let f = parse_wheel_report(&report(0xFFFF, 255, 255, 0, 8)).ok_or("no frame")?;
        assert_eq!(f.x, 32767);
        assert_eq!(f.y, -32768);
        assert!((normalize_steering(f.x) - 1.0).abs() < f32::EPSILON);
        assert!((normalize_pedal(f.rz) - 1.0).abs() < 1e-4);

        let f = parse_wheel_report(&report(0x0000, 0, 0, 0, 8)).ok_or("no frame")?;
        assert_eq!(f.x, -32768);
        Ok(())
    }

    #[test]
    fn buttons_and_hat() -> Result<(), Box<dyn std::error::Error>> {
        let f = parse_wheel_report(&report(0x8000, 0, 0, 0b10_0001, 2)).ok_or("no frame")?;
        assert!(f.button(0));
        assert!(f.button(5));
        assert!(!f.button(4));
        assert_eq!(f.pov[0], 9000);
        Ok(())
    }

    #[test]
    fn rejects_short_or_foreign_reports() {
        assert!(parse_wheel_report(&[0x01, 0x00]).is_none());
        let mut r = report(0x8000, 0, 0, 0, 8);
        r[0] = 0x02;
        assert!(parse_wheel_report(&r).is_none());
    }

    #[test]
    fn spring_report_scales_parameters() {
        let [configure, activate] = spring_reports(ForceFeedbackCommand::spring(0, 30, 100));
        assert_eq!(configure[1..3], [0xFE, 0x0D]);
        assert_eq!(configure[3], 15);
        assert_eq!(configure[5], 76);
        assert_eq!(activate[1], 0x14);
    }

    #[test]
    fn unopened_wheel_reports_not_connected() {
        let mut wheel = HidWheel::new(3);
        assert!(!wheel.connection_status().connected);
        assert!(matches!(
            wheel.poll(),
            Err(InputError::DeviceNotConnected { .. })
        ));
        assert!(!wheel.has_force_feedback());
        // stopping an idle wheel is a no-op
        wheel.stop_force();
    }

    #[test]
    fn shutdown_blocks_further_hardware_calls() {
        let mut wheel = HidWheel::new(0);
        wheel.disconnect(true);
        assert!(matches!(wheel.try_connect(), Err(InputError::ModuleShutDown { .. })));
        assert!(matches!(wheel.poll(), Err(InputError::ModuleShutDown { .. })));
    }
}
