use chrono::{NaiveDateTime, TimeDelta};
use thiserror::Error;

/// A half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn width(&self) -> TimeDelta {
        self.end - self.start
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Window stride must be positive, got {0}")]
    InvalidStride(TimeDelta),
}

/// Iterator over consecutive windows of a fixed stride.
///
/// The first window always starts at `from`, even when `from` is after `to`.
/// A window is emitted for every start that is not after `to`, so the last
/// window may end past `to`; it is never clipped. Cloning the walker restarts
/// from the clone's position.
#[derive(Debug, Clone)]
pub struct WindowWalker {
    cursor: NaiveDateTime,
    to: NaiveDateTime,
    stride: TimeDelta,
    done: bool,
}

impl Iterator for WindowWalker {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        if self.done {
            return None;
        }

        let start = self.cursor;
        let end = start.checked_add_signed(self.stride)?;
        let window = TimeWindow { start, end };

        self.cursor = end;
        if self.cursor > self.to {
            self.done = true;
        }

        Some(window)
    }
}

/// Walk from `from` to `to` in steps of `stride`.
pub fn walk(
    from: NaiveDateTime,
    to: NaiveDateTime,
    stride: TimeDelta,
) -> Result<WindowWalker, WindowError> {
    if stride <= TimeDelta::zero() {
        return Err(WindowError::InvalidStride(stride));
    }

    Ok(WindowWalker {
        cursor: from,
        to,
        stride,
        done: false,
    })
}
