//! Serial control-board adapter.
//!
//! The board streams one line per sample: `acceleration;brake;steering`. The
//! adapter drains whatever bytes the port has buffered (never blocking the tick),
//! splits on `\n`, and hands back only the newest complete line. Older complete
//! lines in the same drain are superseded and dropped.
//!
//! Opening the port happens once at session start. A failure is reported to the
//! caller and not retried from the tick.

use crate::device::{ConnectionStatus, Device, DeviceHandle};
use crate::error::{InputError, InputResult};
use crate::frame::RawFrame;
use crate::metadata::DeviceMeta;
use serialport::{ClearBuffer, FlowControl, SerialPort};
use std::io::{self, Read};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Longest partial line kept between polls; anything longer is line noise.
const MAX_PENDING: usize = 1024;

const READ_TIMEOUT: Duration = Duration::from_millis(5);

/// Byte source behind a [`SerialAdapter`].
pub trait SerialLink: Send {
    /// Append every byte available right now to `out`, without blocking.
    fn read_available(&mut self, out: &mut Vec<u8>) -> io::Result<usize>;

    fn close(&mut self);
}

/// [`SerialLink`] over a real OS serial port.
pub struct PortLink {
    port: Option<Box<dyn SerialPort>>,
}

/// RTS/CTS only when asked for; most boards leave CTS floating.
fn flow_control(hardware: bool) -> FlowControl {
    if hardware {
        FlowControl::Hardware
    } else {
        FlowControl::None
    }
}

impl PortLink {
    pub fn open(port: &str, baud_rate: u32, hardware_flow_control: bool) -> InputResult<Self> {
        let port_handle = serialport::new(port, baud_rate)
            .flow_control(flow_control(hardware_flow_control))
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| InputError::SerialConnect {
                port: port.to_string(),
                baud_rate,
                reason: e.to_string(),
            })?;
        // Stale bytes from before we opened are not a current sample.
        if let Err(e) = port_handle.clear(ClearBuffer::All) {
            debug!(port, "flush after open failed: {e}");
        }
        Ok(Self {
            port: Some(port_handle),
        })
    }
}

impl SerialLink for PortLink {
    fn read_available(&mut self, out: &mut Vec<u8>) -> io::Result<usize> {
        let Some(port) = self.port.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "port closed"));
        };
        let available = port.bytes_to_read().map_err(io::Error::from)? as usize;
        if available == 0 {
            return Ok(0);
        }
        let start = out.len();
        out.resize(start + available, 0);
        match port.read(&mut out[start..]) {
            Ok(n) => {
                out.truncate(start + n);
                Ok(n)
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                out.truncate(start);
                Ok(0)
            }
            Err(e) => {
                out.truncate(start);
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        // dropping the handle closes the port
        self.port = None;
    }
}

/// Serial adapter: frames a byte stream into text lines.
pub struct SerialAdapter {
    name: String,
    port: String,
    baud_rate: u32,
    link: Option<Box<dyn SerialLink>>,
    pending: Vec<u8>,
    /// Set after an overlong line was dropped; bytes are skipped through the next `\n`.
    discarding: bool,
}

impl SerialAdapter {
    /// Open an OS serial port.
    pub fn connect(port: &str, baud_rate: u32, hardware_flow_control: bool) -> InputResult<Self> {
        let link = PortLink::open(port, baud_rate, hardware_flow_control)?;
        info!(port, baud_rate, "serial port is connected");
        Ok(Self::with_link(port, baud_rate, Box::new(link)))
    }

    /// Wrap an already-open link (used for fakes).
    pub fn with_link(port: &str, baud_rate: u32, link: Box<dyn SerialLink>) -> Self {
        Self {
            name: format!("serial:{port}"),
            port: port.to_string(),
            baud_rate,
            link: Some(link),
            pending: Vec::new(),
            discarding: false,
        }
    }

    /// Pull the newest complete line out of `pending`, keeping the partial tail.
    fn take_latest_line(&mut self) -> Option<String> {
        let last_nl = self.pending.iter().rposition(|&b| b == b'\n')?;
        let complete: Vec<u8> = self.pending.drain(..=last_nl).collect();
        complete
            .split(|&b| b == b'\n')
            .map(|l| String::from_utf8_lossy(l).trim().to_string())
            .filter(|l| !l.is_empty())
            .last()
    }
}

impl Device for SerialAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> InputResult<Option<RawFrame>> {
        let Some(link) = self.link.as_mut() else {
            return Err(InputError::DeviceNotConnected {
                device: self.name.clone(),
            });
        };
        if let Err(e) = link.read_available(&mut self.pending) {
            return Err(InputError::DeviceReadFailure {
                device: self.name.clone(),
                reason: e.to_string(),
            });
        }

        if self.discarding {
            match self.pending.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.pending.drain(..=end);
                    self.discarding = false;
                }
                None => {
                    self.pending.clear();
                    return Ok(None);
                }
            }
        }

        let line = self.take_latest_line();
        if self.pending.len() > MAX_PENDING {
            warn!(device = %self.name, "dropping {} bytes without a line break", self.pending.len());
            self.pending.clear();
            self.discarding = true;
        }
        Ok(line.map(RawFrame::Serial))
    }

    fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.link.is_some(),
            handle: DeviceHandle::Port(self.port.clone()),
        }
    }

    fn disconnect(&mut self, _shutdown_module: bool) {
        if let Some(mut link) = self.link.take() {
            link.close();
            self.pending.clear();
            self.discarding = false;
            info!(port = %self.port, "serial port is disconnected");
        }
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta {
            bus: Some("serial".to_string()),
            path: Some(self.port.clone()),
            baud_rate: Some(self.baud_rate),
            ..DeviceMeta::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::VirtualSerial;

    fn adapter(link: VirtualSerial) -> SerialAdapter {
        SerialAdapter::with_link("test0", 9600, Box::new(link))
    }

    #[test]
    fn partial_line_waits_for_terminator() -> Result<(), Box<dyn std::error::Error>> {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        link.push("0.5;0.2");
        assert_eq!(a.poll()?, None);
        link.push(";-0.1\r\n");
        assert_eq!(a.poll()?, Some(RawFrame::Serial("0.5;0.2;-0.1".into())));
        assert_eq!(a.poll()?, None);
        Ok(())
    }

    #[test]
    fn newest_complete_line_wins() -> Result<(), Box<dyn std::error::Error>> {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        link.push("0.1;0.1;0.1\n0.2;0.2;0.2\n0.3;0.3");
        assert_eq!(a.poll()?, Some(RawFrame::Serial("0.2;0.2;0.2".into())));
        link.push(";0.3\n");
        assert_eq!(a.poll()?, Some(RawFrame::Serial("0.3;0.3;0.3".into())));
        Ok(())
    }

    #[test]
    fn runaway_partial_line_is_dropped() -> Result<(), Box<dyn std::error::Error>> {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        link.push(&"x".repeat(MAX_PENDING + 10));
        link.push("0.5;0.");
        assert_eq!(a.poll()?, None);
        assert!(a.pending.is_empty());

        // the rest of the dropped line must not surface as a frame
        link.push("25;-0.3\n");
        assert_eq!(a.poll()?, None);
        link.push("0.1;0.2;0.3\n");
        assert_eq!(a.poll()?, Some(RawFrame::Serial("0.1;0.2;0.3".into())));
        Ok(())
    }

    #[test]
    fn resync_keeps_lines_after_the_dropped_tail() -> Result<(), Box<dyn std::error::Error>> {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        link.push(&"x".repeat(MAX_PENDING + 1));
        assert_eq!(a.poll()?, None);
        link.push("noise\n0.4;0.5;0.6\n");
        assert_eq!(a.poll()?, Some(RawFrame::Serial("0.4;0.5;0.6".into())));
        Ok(())
    }

    #[test]
    fn flow_control_defaults_off() {
        assert_eq!(flow_control(false), FlowControl::None);
        assert_eq!(flow_control(true), FlowControl::Hardware);
    }

    #[test]
    fn read_error_is_read_failure_not_disconnect() {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        link.fail_next_read();
        assert!(matches!(a.poll(), Err(InputError::DeviceReadFailure { .. })));
        assert!(a.connection_status().connected);
    }

    #[test]
    fn disconnect_closes_link() {
        let link = VirtualSerial::new();
        let mut a = adapter(link.clone());
        a.disconnect(false);
        assert!(link.is_closed());
        assert!(!a.connection_status().connected);
        assert!(matches!(a.poll(), Err(InputError::DeviceNotConnected { .. })));
    }

    #[test]
    fn opening_missing_port_fails_cleanly() {
        let err = SerialAdapter::connect("/definitely/not/a/port", 9600, false);
        assert!(matches!(err, Err(InputError::SerialConnect { .. })));
    }
}
