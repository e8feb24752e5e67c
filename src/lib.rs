//! # Doctor Roots
//!
//! A messaging-platform webhook bot that identifies medicinal plants from
//! photos with an image classifier and replies with information about the
//! matched plant, driven by a small per-sender menu state machine.

pub mod bot;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod conversation;
pub mod conversation_store;
pub mod errors;
pub mod image_pipeline;
pub mod media;
pub mod templates;
