use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::progress::{clamp_percentage, deserialize_percentage};
use crate::step_tree::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "agent", alias = "ai")]
    Assistant,
    System,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Agent",
            Self::System => "System",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_percentage",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plan_steps: Vec<Step>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.reasoning.is_none() && self.progress.is_none() && self.plan_steps.is_empty()
    }

    fn normalized(mut self) -> Self {
        self.progress = self.progress.map(clamp_percentage);
        self
    }

    /// Fields present in `update` replace the stored ones.
    fn merge(mut self, update: Self) -> Self {
        if update.reasoning.is_some() {
            self.reasoning = update.reasoning;
        }
        if update.progress.is_some() {
            self.progress = update.progress;
        }
        if !update.plan_steps.is_empty() {
            self.plan_steps = update.plan_steps;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// A collaborator push for one message: creation, appended content, or the
/// final text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageEvent {
    pub message_id: String,
    pub role: Role,
    #[serde(default)]
    pub content_delta: Option<String>,
    #[serde(default)]
    pub content_final: Option<String>,
    #[serde(default)]
    pub is_streaming: bool,
    #[serde(default)]
    pub agent_tag: Option<String>,
    #[serde(default)]
    pub metadata: Option<MessageMetadata>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl MessageEvent {
    pub fn delta(id: impl Into<String>, role: Role, delta: impl Into<String>) -> Self {
        Self {
            message_id: id.into(),
            role,
            content_delta: Some(delta.into()),
            content_final: None,
            is_streaming: true,
            agent_tag: None,
            metadata: None,
            timestamp: None,
        }
    }

    pub fn finished(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            content_delta: None,
            content_final: Some(content.into()),
            is_streaming: false,
            ..Self::delta(id, role, "")
        }
    }

    pub fn with_agent_tag(mut self, tag: impl Into<String>) -> Self {
        self.agent_tag = Some(tag.into());
        self
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageChange {
    Appended,
    ContentGrew,
    Finalized,
    Ignored,
}

impl MessageChange {
    pub fn grew(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutingTurn {
    pub turn_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_tag: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// Ordered chat history plus the set of turns currently executing.
#[derive(Debug, Clone, Default)]
pub struct MessageStream {
    messages: Vec<Message>,
    index: HashMap<String, usize>,
    executing: Vec<ExecutingTurn>,
}

impl MessageStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.index.get(id).and_then(|idx| self.messages.get(*idx))
    }

    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|message| message.is_streaming)
    }

    /// Adds a finished message authored locally (user sends, notices).
    pub fn push_local(&mut self, id: impl Into<String>, role: Role, content: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains_key(&id) {
            return false;
        }
        self.insert(Message {
            id,
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_streaming: false,
            agent_tag: None,
            metadata: None,
        });
        true
    }

    pub fn apply(&mut self, event: MessageEvent) -> MessageChange {
        match self.index.get(&event.message_id).copied() {
            Some(idx) => self.update(idx, event),
            None => self.append(event),
        }
    }

    fn append(&mut self, event: MessageEvent) -> MessageChange {
        let is_streaming = event.is_streaming && event.content_final.is_none();
        if is_streaming {
            self.finalize_streaming_for(event.agent_tag.as_deref());
        }
        let content = event
            .content_final
            .or(event.content_delta)
            .unwrap_or_default();
        self.insert(Message {
            id: event.message_id,
            role: event.role,
            content,
            timestamp: event.timestamp.unwrap_or_else(Utc::now),
            is_streaming,
            agent_tag: event.agent_tag,
            metadata: event
                .metadata
                .map(MessageMetadata::normalized)
                .filter(|metadata| !metadata.is_empty()),
        });
        MessageChange::Appended
    }

    fn update(&mut self, idx: usize, event: MessageEvent) -> MessageChange {
        let Some(message) = self.messages.get_mut(idx) else {
            return MessageChange::Ignored;
        };
        if !message.is_streaming {
            debug!(message_id = %message.id, "update for finished message ignored");
            return MessageChange::Ignored;
        }

        let mut grew = false;
        if let Some(incoming) = event.metadata {
            let current = message.metadata.get_or_insert_with(MessageMetadata::default);
            let merged = current.clone().merge(incoming.normalized());
            if *current != merged {
                *current = merged;
                grew = true;
            }
            if current.is_empty() {
                message.metadata = None;
            }
        }
        if let Some(content) = event.content_final {
            message.content = content;
            message.is_streaming = false;
            return MessageChange::Finalized;
        }
        if let Some(delta) = event.content_delta {
            if !delta.is_empty() {
                message.content.push_str(&delta);
                grew = true;
            }
        }
        if !event.is_streaming {
            message.is_streaming = false;
            return MessageChange::Finalized;
        }
        if grew {
            MessageChange::ContentGrew
        } else {
            MessageChange::Ignored
        }
    }

    fn insert(&mut self, message: Message) {
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    fn finalize_streaming_for(&mut self, agent_tag: Option<&str>) {
        for message in self
            .messages
            .iter_mut()
            .filter(|message| message.is_streaming && message.agent_tag.as_deref() == agent_tag)
        {
            debug!(message_id = %message.id, "superseded streaming message finalized");
            message.is_streaming = false;
        }
    }

    pub fn executing(&self) -> &[ExecutingTurn] {
        &self.executing
    }

    pub fn start_turn(
        &mut self,
        turn_id: impl Into<String>,
        agent_tag: Option<String>,
        started_at: DateTime<Utc>,
    ) -> bool {
        let turn_id = turn_id.into();
        if self.executing.iter().any(|turn| turn.turn_id == turn_id) {
            return false;
        }
        self.executing.push(ExecutingTurn {
            turn_id,
            agent_tag,
            started_at,
        });
        true
    }

    /// Ends a turn. Messages still streaming under its agent tag are
    /// finalized.
    pub fn finish_turn(&mut self, turn_id: &str) -> Option<ExecutingTurn> {
        let position = self
            .executing
            .iter()
            .position(|turn| turn.turn_id == turn_id);
        let Some(position) = position else {
            debug!(turn_id, "finish for unknown turn ignored");
            return None;
        };
        let turn = self.executing.remove(position);
        self.finalize_streaming_for(turn.agent_tag.as_deref());
        Some(turn)
    }
}

#[cfg(test)]
#[path = "../tests/unit/messages_tests.rs"]
mod tests;
