//! HTTP request handlers.

mod completions;
mod health;
mod models;

pub use completions::{chat_completions, completions};
pub use health::health;
pub use models::list_models;
