//! Infrastructure: concrete adapters for configuration and logging. Everything
//! domain/services code depends on here is behind a port; this module is
//! where those ports get wired to the real world.

pub mod config;
pub mod logging;
