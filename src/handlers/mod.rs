mod greeting;
mod metrics;

pub use greeting::{GREETING, greeting_handler};
pub use metrics::metrics_handler;
