//! Chat assistant conversation shaping.
//!
//! The assistant is stateless: the client sends the whole conversation and
//! [`ChatPrompt::from_messages`] decides what the model actually sees.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::config::{CHAT_CONTEXT_PROMPT, CHAT_SHORT_HISTORY};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    #[schema(example = "How do I list a bicycle?")]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatReply {
    pub message: String,
}

/// Speaker as the generative model names it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    User,
    Model,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::User => "user",
            ModelRole::Model => "model",
        }
    }
}

impl From<ChatRole> for ModelRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => ModelRole::User,
            ChatRole::Assistant => ModelRole::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTurn {
    pub role: ModelRole,
    pub text: String,
}

/// Prior turns plus the message to send now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub history: Vec<ModelTurn>,
    pub message: String,
}

impl ChatPrompt {
    pub fn from_messages(messages: &[ChatMessage]) -> AppResult<Self> {
        let (last, earlier) = messages
            .split_last()
            .ok_or_else(|| AppError::validation("Conversation is empty"))?;

        if last.role != ChatRole::User {
            return Err(AppError::validation(
                "The last message must come from the user",
            ));
        }

        // Short conversations: one primed turn, no history.
        if messages.len() <= CHAT_SHORT_HISTORY {
            return Ok(Self {
                history: Vec::new(),
                message: format!("{}\n\n{}", CHAT_CONTEXT_PROMPT, last.content),
            });
        }

        // The opening message is the client's canned greeting.
        let middle = &earlier[1..];
        let history = match middle.first() {
            Some(first) if first.role == ChatRole::Assistant => Vec::new(),
            _ => middle
                .iter()
                .map(|m| ModelTurn {
                    role: m.role.into(),
                    text: m.content.clone(),
                })
                .collect(),
        };

        Ok(Self {
            history,
            message: last.content.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::User,
            content: content.to_string(),
        }
    }

    fn assistant(content: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_empty_conversation_rejected() {
        assert!(matches!(
            ChatPrompt::from_messages(&[]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_last_message_must_be_user() {
        let messages = [user("hi"), assistant("hello")];
        assert!(ChatPrompt::from_messages(&messages).is_err());
    }

    #[test]
    fn test_short_conversation_is_primed_with_context() {
        let messages = [assistant("Hi! How can I help?"), user("How do I sell?")];
        let prompt = ChatPrompt::from_messages(&messages).unwrap();

        assert!(prompt.history.is_empty());
        assert!(prompt.message.starts_with(CHAT_CONTEXT_PROMPT));
        assert!(prompt.message.ends_with("\n\nHow do I sell?"));
    }

    #[test]
    fn test_long_conversation_drops_greeting_and_maps_roles() {
        let messages = [
            assistant("greeting"),
            user("first question"),
            assistant("first answer"),
            user("second question"),
        ];
        let prompt = ChatPrompt::from_messages(&messages).unwrap();

        assert_eq!(prompt.message, "second question");
        assert_eq!(
            prompt.history,
            vec![
                ModelTurn {
                    role: ModelRole::User,
                    text: "first question".to_string()
                },
                ModelTurn {
                    role: ModelRole::Model,
                    text: "first answer".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_history_starting_with_assistant_is_dropped() {
        let messages = [
            user("hello"),
            assistant("answer"),
            user("question"),
        ];
        let prompt = ChatPrompt::from_messages(&messages).unwrap();
        assert!(prompt.history.is_empty());
        assert_eq!(prompt.message, "question");
    }
}
