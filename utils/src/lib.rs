//! Shared utilities for the SONGJAM voting client.

pub mod logging;
pub mod retry;
pub mod time;

pub use logging::{init_logging, LogFormat};
pub use retry::RetryPolicy;
pub use time::format_duration;
