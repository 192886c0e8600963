//! Conversation history owned by a single chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Greeting seeded as the first assistant message. The fragment is the exact
/// rich-text payload the backend ecosystem expects, indentation included.
pub const WELCOME_HTML: &str = "\n      <p><strong>Bem-vindo ao Portal de Periódicos da CAPES com IA!</strong></p>\n      <p>Eu sou a <strong>Academ.ia</strong>, sua assistente virtual para pesquisa acadêmica.</p>\n      <p>Posso te ajudar com:</p>\n      <ul>\n        <li>Buscar artigos sobre inteligência artificial</li>\n        <li>Responder perguntas sobre conteúdo específico</li>\n        <li>Fornecer informações sobre pesquisas acadêmicas</li>\n      </ul>\n      <p>Como posso te ajudar hoje?</p>\n      ";

/// Shown in place of an answer when dispatch fails.
pub const FALLBACK_TEXT: &str = "Erro ao obter a resposta. Tente novamente.";

/// Who produced a message. Closed over exactly these two participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// A single entry in the conversation, immutable once appended.
///
/// User text is always plain; assistant text may carry a markup fragment
/// produced by the backend and is rendered through the sanitizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    fn welcome() -> Self {
        Self::assistant(WELCOME_HTML)
    }
}

/// Append-only message history for one widget instance.
///
/// `revision` increments on every append so view-side observers (the scroll
/// synchronizer) can react to new entries without a render-tree hook.
/// `generation` increments only when the history is reset, and tags in-flight
/// requests so a late response can never land in a store that has moved on.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<Message>,
    revision: u64,
    generation: u64,
}

impl ConversationStore {
    /// A fresh history holding exactly the welcome message.
    pub fn new() -> Self {
        let mut store = Self {
            messages: Vec::new(),
            revision: 0,
            generation: 0,
        };
        store.messages.push(Message::welcome());
        store.revision = 1;
        store
    }

    /// Reset to `[welcome]`. Retires the previous generation.
    pub fn initialize(&mut self) {
        self.messages.clear();
        self.messages.push(Message::welcome());
        self.revision += 1;
        self.generation += 1;
    }

    /// Append one message and return the updated ordered sequence.
    pub fn append(&mut self, message: Message) -> &[Message] {
        self.messages.push(message);
        self.revision += 1;
        &self.messages
    }

    /// Full ordered history, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        // Once constructed the welcome message is always present.
        self.messages.is_empty()
    }

    /// Monotonic counter, bumped on every append.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Identity of the current history epoch.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
