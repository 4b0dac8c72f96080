//! Outbound messaging and the incoming update model.

pub mod port;
pub mod types;
