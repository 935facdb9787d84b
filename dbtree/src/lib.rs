pub mod cli;
pub mod config;
pub mod format;
pub mod logging;
pub mod sample;
pub mod service;
