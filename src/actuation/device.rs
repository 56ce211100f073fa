//! OS pointer injection on top of `rdev::simulate`.
//!
//! Составные примитивы (клики, двойной клик) отправляются с короткой паузой
//! между событиями: некоторые платформы теряют или склеивают события подряд.

use std::fmt::Debug;
use std::thread;
use std::time::Duration;

use enigo::{Enigo, Mouse, Settings};
use rdev::{Button, EventType};

use crate::models::intent::{ScreenPoint, ScreenSize};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    #[error("Failed to simulate {action}: {reason}")]
    Simulate { action: &'static str, reason: String },
    #[error("Failed to query display size: {0}")]
    DisplaySize(String),
    #[error("Failed to query cursor position: {0}")]
    CursorPosition(String),
}

/// Pause between consecutive events of one primitive.
pub const SIMULATE_GAP: Duration = Duration::from_millis(20);

/// The pointer primitives the actuation loop drives.
///
/// Implementations must return promptly; an error is treated as fatal by the
/// caller.
pub trait PointerDevice {
    fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), DeviceError>;
    fn click_primary(&mut self) -> Result<(), DeviceError>;
    fn double_click_primary(&mut self) -> Result<(), DeviceError>;
    fn click_secondary(&mut self) -> Result<(), DeviceError>;
    fn press_primary(&mut self) -> Result<(), DeviceError>;
    fn release_primary(&mut self) -> Result<(), DeviceError>;
}

/// Injects pointer events into the OS input stream.
#[derive(Debug, Default)]
pub struct RdevPointer;

impl RdevPointer {
    pub fn new() -> Self {
        Self
    }
}

impl PointerDevice for RdevPointer {
    fn move_absolute(&mut self, point: ScreenPoint) -> Result<(), DeviceError> {
        send(
            "move",
            EventType::MouseMove {
                x: point.x.round(),
                y: point.y.round(),
            },
        )
    }

    fn click_primary(&mut self) -> Result<(), DeviceError> {
        send_paced("left click", &click_events(Button::Left), SIMULATE_GAP, rdev::simulate)
    }

    fn double_click_primary(&mut self) -> Result<(), DeviceError> {
        let [press, release] = click_events(Button::Left);
        send_paced(
            "double click",
            &[press, release, press, release],
            SIMULATE_GAP,
            rdev::simulate,
        )
    }

    fn click_secondary(&mut self) -> Result<(), DeviceError> {
        send_paced("right click", &click_events(Button::Right), SIMULATE_GAP, rdev::simulate)
    }

    fn press_primary(&mut self) -> Result<(), DeviceError> {
        send("left press", EventType::ButtonPress(Button::Left))
    }

    fn release_primary(&mut self) -> Result<(), DeviceError> {
        send("left release", EventType::ButtonRelease(Button::Left))
    }
}

fn click_events(button: Button) -> [EventType; 2] {
    [EventType::ButtonPress(button), EventType::ButtonRelease(button)]
}

fn send(action: &'static str, event: EventType) -> Result<(), DeviceError> {
    send_paced(action, &[event], SIMULATE_GAP, rdev::simulate)
}

/// Injects `events` in order with `gap` between them (not after the last).
/// Stops at the first failure.
fn send_paced<F, E>(
    action: &'static str,
    events: &[EventType],
    gap: Duration,
    mut simulate: F,
) -> Result<(), DeviceError>
where
    F: FnMut(&EventType) -> Result<(), E>,
    E: Debug,
{
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            thread::sleep(gap);
        }
        simulate(event).map_err(|err| DeviceError::Simulate {
            action,
            reason: format!("{err:?}"),
        })?;
    }
    Ok(())
}

/// Current pointer position as reported by the OS.
pub fn cursor_position() -> Result<ScreenPoint, DeviceError> {
    let enigo = Enigo::new(&Settings::default())
        .map_err(|err| DeviceError::CursorPosition(format!("{err:?}")))?;
    let (x, y) = enigo
        .location()
        .map_err(|err| DeviceError::CursorPosition(format!("{err:?}")))?;
    Ok(ScreenPoint::new(f64::from(x), f64::from(y)))
}

/// Start point for the cursor filter: the queried pointer position, or the
/// screen centre when the query failed.
pub fn cursor_seed(position: Result<ScreenPoint, DeviceError>, screen: ScreenSize) -> ScreenPoint {
    match position {
        Ok(point) if point.x.is_finite() && point.y.is_finite() => point,
        Ok(point) => {
            log::warn!("device: ignoring cursor position {point:?}, using screen centre");
            screen.center()
        }
        Err(err) => {
            log::warn!("device: {err}, using screen centre");
            screen.center()
        }
    }
}

/// Size of the main display, queried once at startup.
pub fn display_size() -> Result<ScreenSize, DeviceError> {
    let (width, height) =
        rdev::display_size().map_err(|err| DeviceError::DisplaySize(format!("{err:?}")))?;
    if width == 0 || height == 0 {
        return Err(DeviceError::DisplaySize(format!(
            "display reported {width}x{height}"
        )));
    }
    Ok(ScreenSize::new(
        width.min(u32::MAX as u64) as u32,
        height.min(u32::MAX as u64) as u32,
    ))
}
