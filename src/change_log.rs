//! Raw wheel frame change logger.
//!
//! Diagnostic only: useful when mapping an undocumented wheel, to see which
//! field a physical control drives. Keeps the previous frame and, on each new
//! frame, logs one line per changed field under a timestamped header. The first
//! frame only seeds the comparison.

use crate::frame::{WheelFrame, BUTTON_COUNT};
use std::time::Instant;
use tracing::info;

/// One field that differs between two consecutive frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: i32,
    pub new: i32,
}

/// Per-field differences from `old` to `new`: named scalars first, then buttons.
pub fn diff_frames(old: &WheelFrame, new: &WheelFrame) -> Vec<FieldChange> {
    let mut changes: Vec<FieldChange> = old
        .named_fields()
        .into_iter()
        .zip(new.named_fields())
        .filter(|((_, a), (_, b))| a != b)
        .map(|((name, a), (_, b))| FieldChange {
            field: name.to_string(),
            old: a,
            new: b,
        })
        .collect();

    for i in 0..BUTTON_COUNT {
        let (a, b) = (old.buttons[i], new.buttons[i]);
        if a != b {
            changes.push(FieldChange {
                field: format!("buttons[{i}]"),
                old: i32::from(a),
                new: i32::from(b),
            });
        }
    }
    changes
}

#[derive(Debug)]
pub struct ChangeLogger {
    started: Instant,
    previous: Option<WheelFrame>,
}

impl ChangeLogger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            previous: None,
        }
    }

    /// Compare against the previous frame, log the differences, and keep `frame`.
    ///
    /// Returns the changes so callers can inspect them; nothing else is affected.
    pub fn observe(&mut self, frame: &WheelFrame) -> Vec<FieldChange> {
        let changes = match &self.previous {
            Some(prev) => diff_frames(prev, frame),
            None => Vec::new(),
        };

        if !changes.is_empty() {
            info!(
                target: "wheelup::change_log",
                "Logging wheel at t={:.3}",
                self.started.elapsed().as_secs_f64()
            );
            for c in &changes {
                info!(
                    target: "wheelup::change_log",
                    "Triggered \"{}\" from {} to {}", c.field, c.old, c.new
                );
            }
        }

        self.previous = Some(frame.clone());
        changes
    }

    pub fn previous(&self) -> Option<&WheelFrame> {
        self.previous.as_ref()
    }
}

impl Default for ChangeLogger {
    fn default() -> Self {
        Self::new()
    }
}
