//! OpenAI-compatible chat completion client.
//!
//! The dispatcher only depends on the [`crate::core::ChatCompleter`] seam;
//! this module provides the bundled implementation of it.

pub mod client;

pub use client::{CompletionClient, CompletionConfig, DEFAULT_BASE_URL};
