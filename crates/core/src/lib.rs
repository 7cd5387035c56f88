pub mod config;
pub mod countdown;

pub use config::{Config, ConfigError, TlsMode};
pub use countdown::{Countdown, Remaining};
