pub mod encourage;
pub mod provider;
pub mod providers;

pub use encourage::{Encourager, MessageGenerator};
pub use provider::{ChatProvider, LlmError, Message, Role};
