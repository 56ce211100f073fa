//! Поток точек руки от внешнего детектора.
//!
//! Формат: один JSON-объект на строку,
//! `{"ts": 1234, "landmarks": [[0.51, 0.62], ...]}` for a detected hand, or
//! `{"ts": 1267, "landmarks": null}`, когда руки в кадре нет. `ts` необязателен
//! (миллисекунды по часам детектора).

use std::io::BufRead;

use serde::Deserialize;

use crate::models::landmarks::Landmark;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read landmark stream: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed landmark message on line {line}: {source}")]
    Parse {
        line: u64,
        source: serde_json::Error,
    },
}

impl SourceError {
    /// A bad message only costs one tick; an I/O failure ends the stream.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Parse { .. })
    }
}

/// One detector result.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkSample {
    /// Raw points; shape is validated later by `LandmarkFrame::new`.
    Hand {
        ts: Option<u64>,
        points: Vec<Landmark>,
    },
    NoHand {
        ts: Option<u64>,
    },
}

pub trait LandmarkSource {
    /// Blocks until the next sample; `Ok(None)` once the stream has ended.
    fn next_sample(&mut self) -> Result<Option<LandmarkSample>, SourceError>;
}

#[derive(Debug, Deserialize)]
struct LandmarkMessage {
    #[serde(default)]
    ts: Option<u64>,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 2]>>,
}

/// Reads newline-delimited JSON messages.
pub struct JsonLinesSource<R: BufRead> {
    reader: R,
    line: u64,
    buffer: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> LandmarkSource for JsonLinesSource<R> {
    fn next_sample(&mut self) -> Result<Option<LandmarkSample>, SourceError> {
        loop {
            self.buffer.clear();
            if self.reader.read_line(&mut self.buffer)? == 0 {
                return Ok(None);
            }
            self.line += 1;

            let trimmed = self.buffer.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message: LandmarkMessage =
                serde_json::from_str(trimmed).map_err(|source| SourceError::Parse {
                    line: self.line,
                    source,
                })?;

            return Ok(Some(match message.landmarks {
                Some(points) => LandmarkSample::Hand {
                    ts: message.ts,
                    points: points.into_iter().map(Landmark::from).collect(),
                },
                None => LandmarkSample::NoHand { ts: message.ts },
            }));
        }
    }
}
