//! Поток актуации: разбирает очередь намерений и управляет указателем.
//!
//! На каждом тике:
//!   1. забрать всё, что накопилось в очереди, по порядку;
//!   2. клики и переходы удержания выполнить сразу и по порядку, а каждый
//!      `Move` лишь перезаписывает единственный слот последнего перемещения;
//!   3. выполнить не больше одного абсолютного перемещения на пачку;
//!   4. выждать один интервал тика.
//! Слот последнего перемещения принадлежит только этому потоку, поэтому
//! движение курсора не копится в очереди и не задерживает клики.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::actuation::device::{DeviceError, PointerDevice};
use crate::actuation::queue::IntentQueue;
use crate::models::intent::{Intent, ScreenPoint};
use crate::models::settings::ActuationSettings;

#[derive(Debug, thiserror::Error)]
pub enum ActuationError {
    #[error("Pointer device failed: {0}")]
    Device(#[from] DeviceError),
    #[error("Failed to spawn actuation thread: {0}")]
    Spawn(std::io::Error),
    #[error("Actuation thread panicked")]
    Panicked,
}

/// What one batch did to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub drained: usize,
    /// Device calls made for non-move intents.
    pub actions: usize,
    /// Moves discarded because a newer one arrived in the same batch.
    pub moves_coalesced: usize,
    pub moved: bool,
}

pub struct ActuationLoop<D: PointerDevice> {
    device: D,
    queue: IntentQueue,
    tick_interval: Duration,
    pressed: bool,
    latest_move: Option<ScreenPoint>,
    stop_flag: Arc<AtomicBool>,
}

impl<D: PointerDevice> ActuationLoop<D> {
    pub fn new(device: D, queue: IntentQueue, settings: &ActuationSettings) -> Self {
        Self {
            device,
            queue,
            tick_interval: settings.tick_interval(),
            pressed: false,
            latest_move: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Drains whatever is queued and applies it without waiting.
    pub fn run_tick(&mut self) -> Result<TickReport, DeviceError> {
        let batch = self.queue.try_pop_all();
        self.apply(batch)
    }

    /// Applies one drained batch: actions in order, then the newest move.
    pub fn apply(&mut self, batch: Vec<Intent>) -> Result<TickReport, DeviceError> {
        let mut report = TickReport {
            drained: batch.len(),
            ..TickReport::default()
        };

        for intent in batch {
            match intent {
                Intent::Move(point) => {
                    if self.latest_move.replace(point).is_some() {
                        report.moves_coalesced += 1;
                    }
                }
                Intent::Click => {
                    self.device.click_primary()?;
                    report.actions += 1;
                }
                Intent::DoubleClick => {
                    self.device.double_click_primary()?;
                    report.actions += 1;
                }
                Intent::RightClick => {
                    self.device.click_secondary()?;
                    report.actions += 1;
                }
                Intent::PressHold => {
                    if !self.pressed {
                        self.device.press_primary()?;
                        self.pressed = true;
                        report.actions += 1;
                    }
                }
                Intent::ReleaseHold => {
                    if self.pressed {
                        self.device.release_primary()?;
                        self.pressed = false;
                        report.actions += 1;
                    }
                }
            }
        }

        if let Some(point) = self.latest_move.take() {
            self.device.move_absolute(point)?;
            report.moved = true;
        }

        Ok(report)
    }

    /// Services the queue until the stop flag is raised.
    ///
    /// While idle the loop blocks on the queue for up to one tick instead of
    /// sleeping blindly; after a non-empty batch it sleeps a full tick so moves
    /// stay at one per tick. On stop, the remaining queue is flushed and a held
    /// button is released.
    pub fn run(mut self) -> Result<(), ActuationError> {
        log::info!(
            "actuation: loop started, tick={}ms",
            self.tick_interval.as_millis()
        );
        let mut idle = true;

        while !self.stop_flag.load(Ordering::Relaxed) {
            let batch = if idle {
                self.queue.wait_pop_all(self.tick_interval)
            } else {
                thread::sleep(self.tick_interval);
                self.queue.try_pop_all()
            };
            idle = batch.is_empty();

            let report = self.apply(batch)?;
            if report.moves_coalesced > 0 {
                log::trace!("actuation: coalesced {} moves", report.moves_coalesced);
            }
        }

        self.run_tick()?;
        if self.pressed {
            self.device.release_primary()?;
            self.pressed = false;
        }
        log::info!("actuation: loop stopped");
        Ok(())
    }
}

/// Owner's handle to the running actuation thread.
pub struct ActuationHandle {
    stop_flag: Arc<AtomicBool>,
    join_handle: JoinHandle<Result<(), ActuationError>>,
}

impl ActuationHandle {
    /// Asks the loop to flush and exit; pair with [`join`](Self::join).
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// True once the thread has exited, normally or not.
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    pub fn join(self) -> Result<(), ActuationError> {
        self.join_handle
            .join()
            .map_err(|_| ActuationError::Panicked)?
    }
}

/// Starts the actuation loop on its own named thread.
pub fn spawn_actuation<D>(
    device: D,
    queue: IntentQueue,
    settings: &ActuationSettings,
) -> Result<ActuationHandle, ActuationError>
where
    D: PointerDevice + Send + 'static,
{
    let actuation = ActuationLoop::new(device, queue, settings);
    let stop_flag = actuation.stop_flag();

    let join_handle = thread::Builder::new()
        .name("gp-actuation".to_string())
        .spawn(move || {
            let result = actuation.run();
            if let Err(err) = &result {
                log::error!("actuation: loop terminated: {err}");
            }
            result
        })
        .map_err(ActuationError::Spawn)?;

    Ok(ActuationHandle {
        stop_flag,
        join_handle,
    })
}
