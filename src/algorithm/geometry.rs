use crate::models::landmarks::{LandmarkFrame, MIDDLE_BASE, WRIST};

/// Euclidean distance between two landmarks in normalized coordinates.
pub fn landmark_distance(frame: &LandmarkFrame, a: usize, b: usize) -> f64 {
    let pa = frame.point(a);
    let pb = frame.point(b);
    (pa.x - pb.x).hypot(pa.y - pb.y)
}

/// Wrist to middle-finger base; every pinch threshold is a multiple of this.
pub fn hand_scale(frame: &LandmarkFrame) -> f64 {
    landmark_distance(frame, WRIST, MIDDLE_BASE)
}
