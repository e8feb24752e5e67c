//! Bot module for handling messaging-platform interactions
//!
//! This module is split into two submodules:
//! - `dispatcher`: Runs the conversation state machine and the image pipeline
//! - `webhook`: Decodes platform webhooks and wraps replies in the reply envelope

pub mod dispatcher;
pub mod webhook;

// Re-export main entry points for use in main.rs
pub use dispatcher::{Dispatcher, InboundMessage};
pub use webhook::{messaging_response, router};
