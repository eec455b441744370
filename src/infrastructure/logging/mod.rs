//! Logging infrastructure: structured, leveled `tracing` spanning every
//! component boundary, with a human-readable or JSON output format selected
//! by configuration (§2.1).

pub mod logger;

pub use logger::LoggerGuard;
