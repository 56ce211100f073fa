//! Сторона распознавания: на входе точки руки, на выходе намерения.

use std::time::{Duration, Instant};

use crate::actuation::queue::IntentQueue;
use crate::actuation::worker::ActuationHandle;
use crate::algorithm::gesture::GestureStateMachine;
use crate::capture::landmark_source::{LandmarkSample, LandmarkSource, SourceError};
use crate::models::intent::GestureLabel;
use crate::models::landmarks::LandmarkFrame;

#[derive(Debug, thiserror::Error)]
pub enum SensingError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Actuation thread stopped while sensing was running")]
    ActuationStopped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensingStats {
    pub frames: u64,
    pub dropouts: u64,
    /// Samples skipped because they were malformed.
    pub rejected: u64,
    pub intents: u64,
}

/// Метки времени детектора, если они есть, иначе локальные монотонные часы.
/// В обоих случаях это смещение от первого сэмпла.
struct SensingClock {
    started: Instant,
    first_ts: Option<u64>,
}

impl SensingClock {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            first_ts: None,
        }
    }

    fn now(&mut self, ts: Option<u64>) -> Duration {
        match ts {
            Some(ts) => {
                let first = *self.first_ts.get_or_insert(ts);
                Duration::from_millis(ts.saturating_sub(first))
            }
            None => self.started.elapsed(),
        }
    }
}

pub struct SensingLoop {
    gestures: GestureStateMachine,
    queue: IntentQueue,
    clock: SensingClock,
    last_label: GestureLabel,
    stats: SensingStats,
}

impl SensingLoop {
    pub fn new(gestures: GestureStateMachine, queue: IntentQueue) -> Self {
        Self {
            gestures,
            queue,
            clock: SensingClock::new(),
            last_label: GestureLabel::None,
            stats: SensingStats::default(),
        }
    }

    pub fn stats(&self) -> SensingStats {
        self.stats
    }

    /// Feeds one sample through the state machine and queues its intents.
    /// Returns the overlay label for this frame.
    pub fn handle_sample(&mut self, sample: LandmarkSample) -> GestureLabel {
        let outcome = match sample {
            LandmarkSample::Hand { ts, points } => {
                let frame = match LandmarkFrame::new(&points) {
                    Ok(frame) => frame,
                    Err(err) => {
                        log::warn!("sensing: rejected landmark frame: {err}");
                        self.stats.rejected += 1;
                        return GestureLabel::None;
                    }
                };
                self.stats.frames += 1;
                let now = self.clock.now(ts);
                self.gestures.process(&frame, now)
            }
            LandmarkSample::NoHand { ts } => {
                self.stats.dropouts += 1;
                let now = self.clock.now(ts);
                self.gestures.hand_lost(now)
            }
        };

        self.stats.intents += outcome.intents.len() as u64;
        self.queue.extend(outcome.intents);

        if outcome.label != self.last_label && outcome.label != GestureLabel::None {
            log::debug!("gesture: {}", outcome.label);
        }
        self.last_label = outcome.label;
        outcome.label
    }

    /// Releases a drag that is still held when sensing ends.
    pub fn finish(&mut self) {
        if let Some(intent) = self.gestures.finish() {
            log::info!("sensing: stream ended during a drag, releasing");
            self.stats.intents += 1;
            self.queue.push(intent);
        }
    }

    /// Pulls samples until the source ends.
    ///
    /// Malformed messages are logged and skipped. If the actuation thread dies
    /// the loop stops with [`SensingError::ActuationStopped`]; the caller joins
    /// the handle to recover the underlying error.
    pub fn run<S: LandmarkSource>(
        &mut self,
        source: &mut S,
        actuation: &ActuationHandle,
    ) -> Result<SensingStats, SensingError> {
        loop {
            if actuation.is_finished() {
                return Err(SensingError::ActuationStopped);
            }

            match source.next_sample() {
                Ok(Some(sample)) => {
                    self.handle_sample(sample);
                }
                Ok(None) => break,
                Err(err) if err.is_recoverable() => {
                    log::warn!("sensing: {err}");
                    self.stats.rejected += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.finish();
        log::info!(
            "sensing: stream ended, frames={} dropouts={} rejected={} intents={}",
            self.stats.frames,
            self.stats.dropouts,
            self.stats.rejected,
            self.stats.intents
        );
        Ok(self.stats)
    }
}
