//! Discrete pointer actions produced by gesture logic.

use std::fmt;

/// Cursor position in absolute screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Display size in pixels, queried once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// An action request handed from the sensing side to the actuation side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    Move(ScreenPoint),
    Click,
    DoubleClick,
    RightClick,
    /// Assert the primary button for a drag.
    PressHold,
    /// Clear the primary button after a drag.
    ReleaseHold,
}

impl Intent {
    pub fn is_move(&self) -> bool {
        matches!(self, Intent::Move(_))
    }
}

/// Human-readable summary of what a frame did, for on-screen diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureLabel {
    #[default]
    None,
    Selecting,
    SelectionEnd,
    Click,
    DoubleClick,
    RightClick,
}

impl GestureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Selecting => "Selecting",
            Self::SelectionEnd => "Selection End",
            Self::Click => "Click",
            Self::DoubleClick => "Double Click",
            Self::RightClick => "Right Click",
        }
    }
}

impl fmt::Display for GestureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
