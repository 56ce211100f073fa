pub mod landmark_source;
pub mod sensing;
