use crate::models::intent::ScreenPoint;

/// Largest usable factor; at 1.0 a step would land exactly on the target.
const MAX_FACTOR: f64 = 1.0 - f64::EPSILON;

/// Exponential smoothing of the cursor target.
///
/// Each step covers `factor` of the remaining distance per axis, so the output
/// converges geometrically and never jumps straight to the target.
#[derive(Debug, Clone)]
pub struct CursorFilter {
    factor: f64,
    previous: ScreenPoint,
}

impl CursorFilter {
    /// `seed` should be the pointer's actual position so the first frame does
    /// not yank the cursor.
    pub fn new(factor: f64, seed: ScreenPoint) -> Self {
        Self {
            factor: factor.clamp(f64::EPSILON, MAX_FACTOR),
            previous: seed,
        }
    }

    pub fn next(&mut self, target: ScreenPoint) -> ScreenPoint {
        let next = ScreenPoint {
            x: self.previous.x + (target.x - self.previous.x) * self.factor,
            y: self.previous.y + (target.y - self.previous.y) * self.factor,
        };
        self.previous = next;
        next
    }

    pub fn position(&self) -> ScreenPoint {
        self.previous
    }
}
