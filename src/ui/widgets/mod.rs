//! Console widgets

pub mod actions;
pub mod files;
pub mod log;
pub mod settings;
pub mod status;
