//! Google Gemini API client.
//!
//! Implements the `ModelClient` trait against the Generative Language
//! REST API: file uploads, cached contents and `generateContent`.

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;
