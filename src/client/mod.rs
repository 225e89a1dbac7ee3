//! Terminal chat client for the answer service.

pub mod http;
pub mod session;

pub use http::{ServiceClient, ServiceReply, TransportError};
pub use session::{ChatMessage, ChatSession, Role};
