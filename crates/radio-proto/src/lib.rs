//! Shared configuration, wire protocol and platform helpers for radiodeck.

pub mod config;
pub mod platform;
pub mod protocol;
