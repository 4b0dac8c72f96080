//! Core logic for the photo → custom emoji pack bot.
//!
//! This crate is framework-agnostic. Telegram lives behind ports (traits)
//! implemented in the adapter crate.

pub mod app;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod pipeline;
pub mod ports;
pub mod publisher;
pub mod replies;
pub mod security;
pub mod sticker;
pub mod tiler;

pub use errors::{Error, Result};
