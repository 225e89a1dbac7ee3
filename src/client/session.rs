use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::http::ServiceClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Kubernetes Manager",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// One conversation. History is append-only until [`clear`](Self::clear).
///
/// `send` takes `&mut self`, so a session can never have two turns in flight.
pub struct ChatSession {
    client: ServiceClient,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(client: ServiceClient) -> Self {
        Self {
            client,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends the user turn, waits for the service and appends its answer.
    /// Transport failures become an `Error: ...` assistant message.
    pub async fn send(&mut self, text: &str) -> &ChatMessage {
        self.messages.push(ChatMessage {
            role: Role::User,
            content: text.to_string(),
        });

        let content = match self.client.ask(text).await {
            Ok(reply) => {
                if let Some(error) = &reply.error {
                    tracing::warn!("Service reported a {} failure", error.kind);
                }
                tracing::debug!("Reply cites {} sources", reply.source_count());
                reply.answer_text().to_string()
            }
            Err(err) => {
                tracing::warn!("Turn failed: {}", err);
                format!("Error: {}", err)
            }
        };

        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Full transcript, one block per message.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            let _ = writeln!(out, "{}: {}\n", message.role.label(), message.content);
        }
        out
    }
}
