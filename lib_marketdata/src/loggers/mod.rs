/// Console and rolling JSON file setup for `tracing`.
pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogSettings, LoggerInitError};
