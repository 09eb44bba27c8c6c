//! Core of the support relay bot: tickets, lifecycle, relay bridge and the
//! staff addressing rules.
//!
//! This crate is framework-agnostic. Telegram lives behind the
//! `MessagingPort` trait, implemented in the adapter crate.

pub mod audit;
pub mod bridge;
pub mod commands;
pub mod config;
pub mod desk;
pub mod domain;
pub mod errors;
pub mod export;
pub mod formatting;
pub mod lifecycle;
pub mod logging;
pub mod messaging;
pub mod resolver;
pub mod ticket;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
