//! Configuration and process-wide service construction for specdex.

pub mod bootstrap;
pub mod config;

pub use bootstrap::Services;
pub use config::Config;
