//! Subsystem modules for chatbridge.

pub mod chat;
pub mod comms;
pub mod memory;
pub mod runtime;
