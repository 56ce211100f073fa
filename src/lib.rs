pub mod actuation;
pub mod algorithm;
pub mod capture;
pub mod models;

use std::path::PathBuf;

use actuation::device::{cursor_position, cursor_seed, display_size, DeviceError, RdevPointer};
use actuation::queue::IntentQueue;
use actuation::worker::{spawn_actuation, ActuationError};
use algorithm::gesture::GestureStateMachine;
use capture::landmark_source::JsonLinesSource;
use capture::sensing::{SensingError, SensingLoop};
use models::settings::{resolve_settings, SettingsError};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Actuation(#[from] ActuationError),
    #[error(transparent)]
    Sensing(#[from] SensingError),
}

/// Reads landmark frames from stdin and drives the system pointer until the
/// stream ends. The first argument, if any, is a settings.json path.
pub fn run() -> Result<(), RunError> {
    env_logger::init();

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = resolve_settings(settings_path.as_deref())?;
    settings.validate()?;

    let screen = display_size()?;
    let seed = cursor_seed(cursor_position(), screen);
    log::info!(
        "run: screen={}x{} cursor seed=({:.0}, {:.0}) smoothing={} close={} open={}",
        screen.width,
        screen.height,
        seed.x,
        seed.y,
        settings.cursor.smoothing,
        settings.gesture.pinch_close_factor,
        settings.gesture.pinch_open_factor
    );

    let queue = IntentQueue::new();
    let actuation = spawn_actuation(RdevPointer::new(), queue.clone(), &settings.actuation)?;

    let gestures =
        GestureStateMachine::new(settings.gesture.clone(), &settings.cursor, screen, seed);
    let mut sensing = SensingLoop::new(gestures, queue);
    let stdin = std::io::stdin();
    let mut source = JsonLinesSource::new(stdin.lock());

    match sensing.run(&mut source, &actuation) {
        Ok(_) => {
            actuation.stop();
            actuation.join()?;
            Ok(())
        }
        Err(SensingError::ActuationStopped) => {
            actuation.join()?;
            Err(SensingError::ActuationStopped.into())
        }
        Err(err) => {
            actuation.stop();
            if let Err(actuation_err) = actuation.join() {
                log::warn!("run: actuation also failed: {actuation_err}");
            }
            Err(err.into())
        }
    }
}
