//! Directive Gateway - an OpenAI-compatible proxy that injects a core
//! directive into every completion request before relaying it upstream.

pub mod config;
pub mod directive;
pub mod error;
pub mod handlers;
pub mod relay;
pub mod server;
pub mod upstream;
