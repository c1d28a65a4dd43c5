//! Language-model backend that turns a prompt into an explanation.

mod client;
mod types;

pub use client::GeminiClient;
