//! Scripted in-process devices.
//!
//! [`VirtualWheel`] and [`VirtualSerial`] stand in for hardware in tests and
//! demos. Both are cheap clones over shared state: box one clone into the
//! registry and keep another to feed input, plug/unplug, and inspect the force
//! commands the session issued.

use crate::backends::serial_port::SerialLink;
use crate::device::{ConnectionStatus, Device, DeviceHandle, ForceFeedbackCommand, WheelDevice};
use crate::error::{InputError, InputResult};
use crate::frame::{RawFrame, WheelFrame};
use crate::metadata::DeviceMeta;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A force-feedback call observed by a [`VirtualWheel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceCall {
    Spring(ForceFeedbackCommand),
    Stop,
}

#[derive(Debug)]
struct WheelScript {
    present: bool,
    connected: bool,
    ffb: bool,
    shut_down: bool,
    frame: WheelFrame,
    failing_reads: u32,
    connect_attempts: u32,
    forces: Vec<ForceCall>,
}

#[derive(Clone, Debug)]
pub struct VirtualWheel {
    name: String,
    index: usize,
    shared: Arc<Mutex<WheelScript>>,
}

impl VirtualWheel {
    /// A wheel that is plugged in, at rest, with the given force-feedback capability.
    pub fn new(ffb: bool) -> Self {
        Self {
            name: "virtual:wheel".to_string(),
            index: 0,
            shared: Arc::new(Mutex::new(WheelScript {
                present: true,
                connected: false,
                ffb,
                shut_down: false,
                frame: WheelFrame::at_rest(),
                failing_reads: 0,
                connect_attempts: 0,
                forces: Vec::new(),
            })),
        }
    }

    fn script(&self) -> MutexGuard<'_, WheelScript> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn plug_in(&self) {
        self.script().present = true;
    }

    /// Pull the cable. The adapter notices on its next poll.
    pub fn unplug(&self) {
        self.script().present = false;
    }

    pub fn set_frame(&self, frame: WheelFrame) {
        self.script().frame = frame;
    }

    /// Set steering and pedal axes in raw device units.
    pub fn set_axes(&self, x: i32, y: i32, rz: i32) {
        let mut s = self.script();
        s.frame.x = x;
        s.frame.y = y;
        s.frame.rz = rz;
    }

    pub fn set_button(&self, idx: usize, pressed: bool) {
        self.script().frame.set_button(idx, pressed);
    }

    pub fn set_pov(&self, value: i32) {
        self.script().frame.pov[0] = value;
    }

    pub fn fail_next_read(&self) {
        self.script().failing_reads += 1;
    }

    pub fn connect_attempts(&self) -> u32 {
        self.script().connect_attempts
    }

    pub fn forces(&self) -> Vec<ForceCall> {
        self.script().forces.clone()
    }

    pub fn last_force(&self) -> Option<ForceCall> {
        self.script().forces.last().copied()
    }

    pub fn clear_forces(&self) {
        self.script().forces.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.script().shut_down
    }
}

impl Device for VirtualWheel {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self) -> InputResult<Option<RawFrame>> {
        let mut s = self.script();
        if s.shut_down {
            return Err(InputError::ModuleShutDown {
                device: self.name.clone(),
            });
        }
        if s.connected && !s.present {
            s.connected = false;
        }
        if !s.connected {
            return Err(InputError::DeviceNotConnected {
                device: self.name.clone(),
            });
        }
        if s.failing_reads > 0 {
            s.failing_reads -= 1;
            return Err(InputError::DeviceReadFailure {
                device: self.name.clone(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(Some(RawFrame::Wheel(Box::new(s.frame.clone()))))
    }

    fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.script().connected,
            handle: DeviceHandle::Index(self.index),
        }
    }

    fn disconnect(&mut self, shutdown_module: bool) {
        let mut s = self.script();
        if s.connected {
            s.forces.push(ForceCall::Stop);
        }
        s.connected = false;
        if shutdown_module {
            s.shut_down = true;
        }
    }

    fn metadata(&self) -> DeviceMeta {
        DeviceMeta {
            bus: Some("virtual".to_string()),
            product_string: Some("Virtual Wheel".to_string()),
            ..DeviceMeta::default()
        }
    }
}

impl WheelDevice for VirtualWheel {
    fn try_connect(&mut self) -> InputResult<()> {
        let mut s = self.script();
        if s.shut_down {
            return Err(InputError::ModuleShutDown {
                device: self.name.clone(),
            });
        }
        s.connect_attempts += 1;
        if s.present {
            s.connected = true;
            Ok(())
        } else {
            Err(InputError::DeviceNotConnected {
                device: self.name.clone(),
            })
        }
    }

    fn has_force_feedback(&self) -> bool {
        let s = self.script();
        s.connected && s.ffb
    }

    fn issue_force(&mut self, command: ForceFeedbackCommand) {
        self.script().forces.push(ForceCall::Spring(command));
    }

    fn stop_force(&mut self) {
        self.script().forces.push(ForceCall::Stop);
    }
}

#[derive(Debug, Default)]
struct SerialScript {
    bytes: VecDeque<u8>,
    fail_next: bool,
    closed: bool,
}

/// In-memory [`SerialLink`]: bytes pushed by the test come out of the next read.
#[derive(Clone, Debug, Default)]
pub struct VirtualSerial {
    shared: Arc<Mutex<SerialScript>>,
}

impl VirtualSerial {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, SerialScript> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue raw text exactly as given.
    pub fn push(&self, text: &str) {
        self.script().bytes.extend(text.bytes());
    }

    /// Queue one line with a `\r\n` terminator, as a microcontroller `println` sends it.
    pub fn push_line(&self, line: &str) {
        self.push(line);
        self.push("\r\n");
    }

    pub fn fail_next_read(&self) {
        self.script().fail_next = true;
    }

    pub fn is_closed(&self) -> bool {
        self.script().closed
    }
}

impl SerialLink for VirtualSerial {
    fn read_available(&mut self, out: &mut Vec<u8>) -> io::Result<usize> {
        let mut s = self.script();
        if std::mem::take(&mut s.fail_next) {
            return Err(io::Error::new(io::ErrorKind::Other, "scripted failure"));
        }
        let n = s.bytes.len();
        out.extend(s.bytes.drain(..));
        Ok(n)
    }

    fn close(&mut self) {
        self.script().closed = true;
    }
}
