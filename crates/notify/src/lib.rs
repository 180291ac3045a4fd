//! Notification engine for tray lifecycle alerts.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Telegram notifier implementation
//! - Dispatcher that fans a notification out to configured channels,
//!   absorbing delivery failures (best-effort by design)
//! - Message composition for tray added / removed / overdue events

pub mod dispatcher;
pub mod messages;
pub mod telegram;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use traits::{DispatchResult, Notification, Notifier, NotifyError};
