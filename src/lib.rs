//! Figurine Bot
//!
//! A Telegram bot that turns a photo or avatar into a figurine-style render by
//! forwarding it to an `OpenRouter` image model and relaying the result back.

/// Telegram transport: commands, trigger handling, replies
pub mod bot;
/// Configuration management
pub mod config;
/// Error type shared by every stage of a generation run
pub mod error;
/// Trigger parsing, presets, image resolution and the run pipeline
pub mod figurine;
/// Generation client for the `OpenRouter` chat completions API
pub mod llm;
/// Log output with secret redaction
pub mod logging;
/// On-disk API key store with round-robin rotation
pub mod storage;
