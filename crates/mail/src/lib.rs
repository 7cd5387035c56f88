//! Outbound mail for the countdown courier.
//!
//! This crate provides:
//! - `MailTransport` trait with a `lettre`-backed SMTP implementation
//! - `Deliverer` that tries implicit TLS and STARTTLS in turn
//! - Minijinja composition of the daily HTML/plain-text message
//! - `FailureAlert` that tells the operator when a cycle gives up

pub mod alert;
pub mod compose;
pub mod delivery;
pub mod smtp;
pub mod traits;

pub use alert::OperatorAlert;
pub use compose::{Composer, MailBody};
pub use delivery::Delivery;
pub use smtp::SmtpMailer;
pub use traits::{Deliverer, FailureAlert, MailError, MailTransport, OutboundMail};
