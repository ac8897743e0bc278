//! Signal normalizer: raw device units to canonical control axes.
//!
//! ## Wheel
//! - Steering `x`: `[-32767, 32767]` scaled linearly to `[-1, 1]`, clamped (so
//!   `-32768` also reads `-1`).
//! - Pedals `y`/`rz`: `|(raw - 32767) / 65535|`, so `32767` (released) is `0.0`
//!   and `-32768` (floored) is `1.0`.
//! - POV hat `pov[0]`: `0`, `9000`, `18000`, `27000` are forward, right, back,
//!   left camera pans. Anything else is "no pan".
//!
//! ## Serial
//! `"<acceleration>;<brake>;<steering>"`. Characters after the third field are
//! ignored. A field that does not parse as a number reads `0.0`. Steering is
//! sign-flipped and brake is reported as `1 - brake` because the board's brake
//! pedal reports inverse travel.

use crate::event::{CameraPan, DigitalEvent, NormalizedInput};
use crate::frame::WheelFrame;

/// Two analog values closer than this are "unchanged".
pub const ANALOG_THRESHOLD: f32 = 0.01;

pub const STEERING_RAW_MAX: f32 = 32767.0;
pub const PEDAL_RAW_SPAN: f32 = 65535.0;

/// Wheel buttons that engage reverse (the four face pads).
pub const REVERSE_BUTTONS: [usize; 4] = [0, 1, 2, 3];
pub const TURN_SIGNAL_RIGHT_BUTTON: usize = 4;
pub const TURN_SIGNAL_LEFT_BUTTON: usize = 5;
pub const CAMERA_UP_BUTTON: usize = 19;
pub const CAMERA_DOWN_BUTTON: usize = 20;

#[inline]
pub fn nearly_equal(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() <= tolerance
}

#[inline]
pub fn normalize_steering(raw: i32) -> f32 {
    (raw as f32).clamp(-STEERING_RAW_MAX, STEERING_RAW_MAX) / STEERING_RAW_MAX
}

#[inline]
pub fn normalize_pedal(raw: i32) -> f32 {
    ((raw as f32 - STEERING_RAW_MAX) / PEDAL_RAW_SPAN)
        .abs()
        .min(1.0)
}

/// Map a POV hat angle (hundredths of a degree) to a camera pan.
pub fn pov_to_pan(raw: i32) -> Option<CameraPan> {
    match raw {
        0 => Some(CameraPan::Forward),
        9000 => Some(CameraPan::Right),
        18000 => Some(CameraPan::Back),
        27000 => Some(CameraPan::Left),
        _ => None,
    }
}

/// Camera pan for a wheel frame. The hat is checked first; the dedicated up/down
/// buttons only apply when the hat is idle. First match wins.
pub fn wheel_camera_pan(frame: &WheelFrame) -> Option<CameraPan> {
    pov_to_pan(frame.pov[0]).or_else(|| {
        if frame.button(CAMERA_UP_BUTTON) {
            Some(CameraPan::Up)
        } else if frame.button(CAMERA_DOWN_BUTTON) {
            Some(CameraPan::Down)
        } else {
            None
        }
    })
}

pub fn normalize_wheel(frame: &WheelFrame) -> NormalizedInput {
    let mut input = NormalizedInput::analog(
        normalize_steering(frame.x),
        normalize_pedal(frame.y),
        normalize_pedal(frame.rz),
    );

    if REVERSE_BUTTONS.iter().any(|&b| frame.button(b)) {
        input.digital.insert(DigitalEvent::ReverseHeld);
    }
    if frame.button(TURN_SIGNAL_RIGHT_BUTTON) {
        input.digital.insert(DigitalEvent::TurnSignalRight);
    }
    if frame.button(TURN_SIGNAL_LEFT_BUTTON) {
        input.digital.insert(DigitalEvent::TurnSignalLeft);
    }
    if let Some(pan) = wheel_camera_pan(frame) {
        input.digital.insert(DigitalEvent::CameraPan(pan));
    }
    input
}

/// Decoded serial line, still in the board's own conventions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SerialReading {
    pub acceleration: f32,
    pub brake: f32,
    pub steering: f32,
}

/// Result of parsing a serial line: the reading plus the names of fields that
/// fell back to zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedLine {
    pub reading: SerialReading,
    pub malformed: Vec<&'static str>,
}

impl ParsedLine {
    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

const SERIAL_FIELDS: [&str; 3] = ["acceleration", "brake", "steering"];

pub fn parse_serial_line(line: &str) -> ParsedLine {
    let mut values = [0.0f32; 3];
    let mut malformed = Vec::new();
    let mut fields = line.split(';');

    for (slot, name) in values.iter_mut().zip(SERIAL_FIELDS) {
        match fields.next().map(parse_leading_float) {
            Some(Some((v, complete))) => {
                *slot = v;
                if !complete {
                    malformed.push(name);
                }
            }
            _ => malformed.push(name),
        }
    }

    ParsedLine {
        reading: SerialReading {
            acceleration: values[0],
            brake: values[1],
            steering: values[2],
        },
        malformed,
    }
}

pub fn normalize_serial(reading: SerialReading) -> NormalizedInput {
    NormalizedInput::analog(
        (-reading.steering).clamp(-1.0, 1.0),
        reading.acceleration.clamp(0.0, 1.0),
        (1.0 - reading.brake).clamp(0.0, 1.0),
    )
}

/// Parse the longest numeric prefix of `s` after trimming whitespace.
///
/// Returns `None` if there is no numeric prefix. The flag is `false` when
/// trailing characters were dropped.
fn parse_leading_float(s: &str) -> Option<(f32, bool)> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    let value = s.get(..end)?.parse::<f32>().ok()?;
    Some((value, end == s.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::POV_CENTERED;
    use proptest::prelude::*;

    #[test]
    fn steering_boundaries() {
        assert!((normalize_steering(32767) - 1.0).abs() < f32::EPSILON);
        assert!((normalize_steering(-32767) + 1.0).abs() < f32::EPSILON);
        assert!(normalize_steering(0).abs() < f32::EPSILON);
        // -32768 is clamped to full left
        assert!((normalize_steering(-32768) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pedal_boundaries() {
        assert!(normalize_pedal(32767).abs() < f32::EPSILON);
        assert!((normalize_pedal(-32768) - 1.0).abs() < 1e-4);
        // the "defaulting" raw 0 reads as half travel
        assert!((normalize_pedal(0) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn pov_mapping() {
        assert_eq!(pov_to_pan(0), Some(CameraPan::Forward));
        assert_eq!(pov_to_pan(9000), Some(CameraPan::Right));
        assert_eq!(pov_to_pan(18000), Some(CameraPan::Back));
        assert_eq!(pov_to_pan(27000), Some(CameraPan::Left));
        assert_eq!(pov_to_pan(4500), None);
        assert_eq!(pov_to_pan(POV_CENTERED), None);
    }

    #[test]
    fn hat_beats_camera_buttons() {
        let mut f = WheelFrame::at_rest();
        f.set_button(CAMERA_UP_BUTTON, true);
        assert_eq!(wheel_camera_pan(&f), Some(CameraPan::Up));
        f.pov[0] = 18000;
        assert_eq!(wheel_camera_pan(&f), Some(CameraPan::Back));
    }

    #[test]
    fn up_beats_down() {
        let mut f = WheelFrame::at_rest();
        f.set_button(CAMERA_UP_BUTTON, true);
        f.set_button(CAMERA_DOWN_BUTTON, true);
        assert_eq!(wheel_camera_pan(&f), Some(CameraPan::Up));
    }

    #[test]
    fn wheel_buttons_become_digital_events() {
        let mut f = WheelFrame::at_rest();
        f.set_button(2, true);
        f.set_button(TURN_SIGNAL_LEFT_BUTTON, true);
        let n = normalize_wheel(&f);
        assert!(n.is_held(DigitalEvent::ReverseHeld));
        assert!(n.is_held(DigitalEvent::TurnSignalLeft));
        assert!(!n.is_held(DigitalEvent::TurnSignalRight));
        assert_eq!(n.camera_pan(), None);
    }

    #[test]
    fn serial_line_example() {
        let parsed = parse_serial_line("0.5;0.25;-0.3");
        assert!(parsed.is_clean());
        let n = normalize_serial(parsed.reading);
        assert!((n.throttle - 0.5).abs() < 1e-6);
        assert!((n.brake - 0.75).abs() < 1e-6);
        assert!((n.steering - 0.3).abs() < 1e-6);
    }

    #[test]
    fn serial_non_numeric_field_reads_zero() {
        let parsed = parse_serial_line("abc;0.25;-0.3");
        assert_eq!(parsed.malformed, vec!["acceleration"]);
        assert!(parsed.reading.acceleration.abs() < f32::EPSILON);
        assert!((parsed.reading.brake - 0.25).abs() < 1e-6);
    }

    #[test]
    fn serial_extra_fields_are_ignored() {
        let parsed = parse_serial_line("0.1;0.2;0.3;0.9;junk");
        assert!(parsed.is_clean());
        assert!((parsed.reading.steering - 0.3).abs() < 1e-6);
    }

    #[test]
    fn serial_missing_fields_read_zero() {
        let parsed = parse_serial_line("0.7");
        assert_eq!(parsed.malformed, vec!["brake", "steering"]);
        assert!((parsed.reading.acceleration - 0.7).abs() < 1e-6);
        // brake 0 on the board means fully pressed after inversion
        assert!((normalize_serial(parsed.reading).brake - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn serial_line_terminators_are_tolerated() {
        let parsed = parse_serial_line("0.5;0.5;0.5\r\n");
        assert!(parsed.is_clean());
        assert!((parsed.reading.steering - 0.5).abs() < 1e-6);
    }

    #[test]
    fn leading_float_keeps_numeric_prefix() {
        assert_eq!(parse_leading_float("12.5xyz"), Some((12.5, false)));
        assert_eq!(parse_leading_float("-.5"), Some((-0.5, true)));
        assert_eq!(parse_leading_float("1e2"), Some((100.0, true)));
        assert_eq!(parse_leading_float("3e"), Some((3.0, false)));
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float(""), None);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(256))]

        #[test]
        fn prop_steering_is_scaled_and_clamped(raw in -40000i32..=40000i32) {
            let n = normalize_steering(raw);
            let expected = (raw as f32 / 32767.0).clamp(-1.0, 1.0);
            prop_assert!((n - expected).abs() < 1e-6);
        }

        #[test]
        fn prop_pedal_stays_in_unit_range(raw in -32768i32..=32767i32) {
            let n = normalize_pedal(raw);
            prop_assert!((0.0..=1.0).contains(&n), "pedal {} out of range", n);
            prop_assert!((normalize_pedal(raw) - n).abs() < f32::EPSILON);
        }

        #[test]
        fn prop_serial_never_panics(line in ".{0,64}") {
            let n = normalize_serial(parse_serial_line(&line).reading);
            prop_assert!((-1.0..=1.0).contains(&n.steering));
            prop_assert!((0.0..=1.0).contains(&n.throttle));
            prop_assert!((0.0..=1.0).contains(&n.brake));
        }

        #[test]
        fn prop_serial_well_formed_round_trip(
            a in 0.0f32..=1.0,
            b in 0.0f32..=1.0,
            s in -1.0f32..=1.0,
        ) {
            let parsed = parse_serial_line(&format!("{a};{b};{s}"));
            prop_assert!(parsed.is_clean());
            prop_assert!((parsed.reading.acceleration - a).abs() < 1e-6);
            prop_assert!((parsed.reading.brake - b).abs() < 1e-6);
            prop_assert!((parsed.reading.steering - s).abs() < 1e-6);
        }
    }
}
