//! Outbound side of the gateway: wire types and the transport used to reach
//! the upstream chat-completion API.

mod error;
mod http;
mod transport;
mod types;

pub use error::UpstreamError;
pub use http::{HttpTransport, build_client};
pub use transport::{ByteStream, OutboundRequest, Transport, UpstreamReply};
pub use types::{
    ChatCompletionRequest, CompletionRequest, Message, MessageContent, Role, is_truthy,
    template_string,
};
