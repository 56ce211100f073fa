pub mod cursor_smoothing;
pub mod geometry;
pub mod gesture;
