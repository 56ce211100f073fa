//! Actuation side: intent queue, pointer device and the loop that drives it.

pub mod device;
pub mod queue;
pub mod worker;
