//! Comms subsystem: the external I/O surfaces of the chatbot.
//!
//! Each channel implements [`Component`] and captures an `Arc<ChatService>`
//! at construction. Today the only channel is the axum HTTP server that
//! serves the chat page and its JSON API.

pub mod axum_channel;

use std::sync::Arc;

use crate::config::Config;
use crate::subsystems::chat::ChatService;
use crate::subsystems::runtime::Component;

pub use axum_channel::AxumChannel;

/// Build the configured channels, ready to hand to
/// [`run_components`](crate::subsystems::runtime::run_components).
pub fn channels(config: &Config, chat: Arc<ChatService>) -> Vec<Box<dyn Component>> {
    vec![Box::new(AxumChannel::new(
        "http",
        config.comms.http.bind.clone(),
        config.title.clone(),
        chat,
    ))]
}
