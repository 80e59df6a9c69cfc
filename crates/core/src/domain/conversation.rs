use crate::domain::company::CompanySnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The AI counterpart.
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Text that is non-empty after trimming. Keeps the caller's text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonBlankText(String);

impl NonBlankText {
    pub fn parse(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Append-only dialogue log. Turns are never reordered, edited or removed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the session with the strategist's greeting.
    pub fn with_greeting(company: &CompanySnapshot) -> Self {
        let mut conversation = Self::new();
        conversation.push_model(format!(
            "Hello. I have reviewed the latest reports for {}. Revenue is trending up, but our burn rate requires attention. What strategic matter shall we address today?",
            company.name
        ));
        conversation
    }

    pub fn push_user(&mut self, text: &NonBlankText) -> &ConversationTurn {
        self.push(ConversationTurn::new(Role::User, text.as_str()))
    }

    pub fn push_model(&mut self, text: impl Into<String>) -> &ConversationTurn {
        self.push(ConversationTurn::new(Role::Model, text))
    }

    fn push(&mut self, turn: ConversationTurn) -> &ConversationTurn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True while the newest turn is a user turn without a reply.
    pub fn awaiting_reply(&self) -> bool {
        matches!(self.turns.last(), Some(turn) if turn.role == Role::User)
    }
}
