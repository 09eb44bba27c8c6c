//! Messenger abstractions shared by the core and the Telegram adapter.

pub mod port;
pub mod types;
