//! Infrastructure layer: configuration, logging, and port implementations.

pub mod config;
pub mod logging;
pub mod runners;
