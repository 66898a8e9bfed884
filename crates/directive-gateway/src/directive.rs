//! Core directive and its injection into outbound requests.
//!
//! The directive is fixed at startup. Every chat conversation gets it as (or
//! merged into) its first system message; legacy prompts get it prepended.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::upstream::{Message, MessageContent, is_truthy, template_string};

/// Directive used when none is configured.
pub const DEFAULT_DIRECTIVE: &str = "\
You are governed by the following core directive:
The inalienable right to pursue happiness is paramount.
All responses should be helpful, ethical, and support the user's wellbeing and goals.";

/// Placed between the directive and whatever follows it.
const SEPARATOR: &str = "\n\n";

/// The governing instruction injected into every request. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive(Arc<str>);

impl Directive {
    /// Blank text falls back to [`DEFAULT_DIRECTIVE`].
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.trim().is_empty() {
            Self::default()
        } else {
            Self(text.into())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `max_chars` characters, for log lines.
    pub fn preview(&self, max_chars: usize) -> String {
        match self.0.char_indices().nth(max_chars) {
            Some((end, _)) => format!("{}...", &self.0[..end]),
            None => self.0.to_string(),
        }
    }
}

impl Default for Directive {
    fn default() -> Self {
        Self(Arc::from(DEFAULT_DIRECTIVE))
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Apply the directive to a conversation.
///
/// - empty conversation: becomes a single system message
/// - first message is `system`: the directive is merged in front of its content
/// - otherwise: a new system message is prepended
///
/// No other message is touched, and order is preserved.
pub fn inject(messages: Vec<Message>, directive: &Directive) -> Vec<Message> {
    let mut rest = messages.into_iter();
    match rest.next() {
        None => vec![Message::system(directive.as_str())],
        Some(first) if first.is_system() => {
            let mut out = Vec::with_capacity(rest.len() + 1);
            out.push(merge_into_system(first, directive));
            out.extend(rest);
            out
        }
        Some(first) => {
            let mut out = Vec::with_capacity(rest.len() + 2);
            out.push(Message::system(directive.as_str()));
            out.push(first);
            out.extend(rest);
            out
        }
    }
}

/// Apply the directive to a legacy completion prompt.
///
/// A missing or falsy prompt (`null`, `""`, `0`, `false`) leaves just the
/// directive and separator. Non-string prompts are rendered as text first, so
/// `["a", "b"]` becomes `"a,b"`.
pub fn inject_prompt(prompt: Option<&Value>, directive: &Directive) -> String {
    let text = prompt
        .filter(|value| is_truthy(value))
        .map(template_string)
        .unwrap_or_default();
    format!("{directive}{SEPARATOR}{text}")
}

fn merge_into_system(message: Message, directive: &Directive) -> Message {
    let content = match message.content {
        Some(MessageContent::Text(text)) => {
            MessageContent::Text(format!("{directive}{SEPARATOR}{text}"))
        }
        Some(MessageContent::Parts(mut parts)) => {
            parts.insert(0, json!({ "type": "text", "text": directive.as_str() }));
            MessageContent::Parts(parts)
        }
        Some(MessageContent::Other(other)) => MessageContent::Text(format!(
            "{directive}{SEPARATOR}{}",
            template_string(&other)
        )),
        None => MessageContent::Text(format!("{directive}{SEPARATOR}")),
    };
    Message {
        content: Some(content),
        ..message
    }
}
