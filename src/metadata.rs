//! Device metadata snapshot.
//!
//! [`DeviceMeta`] is a lightweight, cloneable description of an opened device,
//! used for connect logs and for hosts that want to show what is plugged in.
//! Backends populate what they know; unknown fields remain `None`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Short bus hint: `"usb"`, `"serial"`, `"virtual"`.
    pub bus: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    /// Friendly product name reported by the driver/firmware.
    pub product_string: Option<String>,
    pub serial_number: Option<String>,
    /// OS path of the device node or serial port. Diagnostic, not identity.
    pub path: Option<String>,
    pub baud_rate: Option<u32>,
}

impl DeviceMeta {
    /// Product name, falling back to `"Unknown"`.
    pub fn friendly_name(&self) -> &str {
        self.product_string.as_deref().unwrap_or("Unknown")
    }
}

impl fmt::Display for DeviceMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.friendly_name())?;
        if let (Some(vid), Some(pid)) = (self.vid, self.pid) {
            write!(f, " [{vid:04x}:{pid:04x}]")?;
        }
        if let Some(path) = &self.path {
            write!(f, " @ {path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_known_fields() {
        let meta = DeviceMeta {
            vid: Some(0x046d),
            pid: Some(0xc26e),
            product_string: Some("G923".into()),
            ..DeviceMeta::default()
        };
        assert_eq!(meta.to_string(), "G923 [046d:c26e]");
        assert_eq!(DeviceMeta::default().friendly_name(), "Unknown");
    }
}
