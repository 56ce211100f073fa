pub mod intent;
pub mod landmarks;
pub mod settings;
