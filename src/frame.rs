//! Raw device frames.
//!
//! A raw frame is an immutable snapshot of one device at one polling instant,
//! still in the device's own units. Wheel frames follow the DirectInput joystick
//! layout that wheel SDKs expose: signed 16-bit axes, POV hats in hundredths of a
//! degree, and a 128-entry button array where the high bit means "pressed".

use serde::{Deserialize, Serialize};

/// Number of entries in [`WheelFrame::buttons`].
pub const BUTTON_COUNT: usize = 128;

/// Number of POV hats reported per frame.
pub const POV_COUNT: usize = 4;

/// POV value meaning "hat not pressed".
pub const POV_CENTERED: i32 = -1;

/// Axis rest value the pedal axes report when fully released.
pub const PEDAL_RELEASED: i32 = 32767;

/// Snapshot of a wheel/pedal device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelFrame {
    /// Steering, `-32768` (full left) .. `32767` (full right).
    pub x: i32,
    /// Accelerator pedal, `32767` released .. `-32768` floored.
    pub y: i32,
    pub z: i32,
    pub rx: i32,
    pub ry: i32,
    /// Brake pedal, same convention as [`y`](Self::y).
    pub rz: i32,
    pub sliders: [i32; 2],
    /// Hundredths of a degree clockwise from up, or [`POV_CENTERED`].
    pub pov: [i32; POV_COUNT],
    #[serde(with = "button_array")]
    pub buttons: [u8; BUTTON_COUNT],
}

impl Default for WheelFrame {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            z: 0,
            rx: 0,
            ry: 0,
            rz: 0,
            sliders: [0; 2],
            pov: [POV_CENTERED; POV_COUNT],
            buttons: [0; BUTTON_COUNT],
        }
    }
}

impl WheelFrame {
    /// A frame with the wheel centered and both pedals released.
    pub fn at_rest() -> Self {
        Self {
            y: PEDAL_RELEASED,
            rz: PEDAL_RELEASED,
            ..Self::default()
        }
    }

    #[inline]
    pub fn button(&self, idx: usize) -> bool {
        self.buttons.get(idx).is_some_and(|b| b & 0x80 != 0)
    }

    pub fn set_button(&mut self, idx: usize, pressed: bool) {
        if let Some(b) = self.buttons.get_mut(idx) {
            *b = if pressed { 0x80 } else { 0 };
        }
    }

    /// Every scalar field with a stable display name, in a fixed order.
    ///
    /// Used by the change logger; buttons are compared separately.
    pub fn named_fields(&self) -> [(&'static str, i32); 12] {
        [
            ("x", self.x),
            ("y", self.y),
            ("z", self.z),
            ("rx", self.rx),
            ("ry", self.ry),
            ("rz", self.rz),
            ("sliders[0]", self.sliders[0]),
            ("sliders[1]", self.sliders[1]),
            ("pov[0]", self.pov[0]),
            ("pov[1]", self.pov[1]),
            ("pov[2]", self.pov[2]),
            ("pov[3]", self.pov[3]),
        ]
    }
}

/// Device-specific frame returned by [`Device::poll`](crate::device::Device::poll).
#[derive(Clone, Debug, PartialEq)]
pub enum RawFrame {
    Wheel(Box<WheelFrame>),
    /// One complete text line from the serial board, without the line terminator.
    Serial(String),
}

// serde only derives arrays up to 32 elements.
mod button_array {
    use super::BUTTON_COUNT;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8; BUTTON_COUNT], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; BUTTON_COUNT], D::Error> {
        let v = Vec::<u8>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::invalid_length(len, &"128 button bytes"))
    }
}
