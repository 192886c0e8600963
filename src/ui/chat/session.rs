//! Chat session controller: visibility, submission flow, response delivery.

use crate::backend::RagClient;
use crate::events::DispatchOutcome;
use crate::ui::chat::composer::{ChatComposer, ComposerResult};
use crate::ui::chat::history::{self, TranscriptView};
use crate::ui::chat::scroll::ScrollSync;
use crate::ui::chat::store::{ConversationStore, Message, FALLBACK_TEXT};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use tokio::sync::mpsc;
use uuid::Uuid;

const OVERLAY_TITLE: &str = "Academ.ia - Assistente Virtual";
const COMPOSER_PLACEHOLDER: &str = "Digite sua pergunta...";

/// Whether the overlay is on screen. Independent of the history: opening and
/// closing never touch the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Closed,
    Open,
}

/// One chat widget instance.
///
/// Owns its history, pending input, scroll state and visibility; a host may
/// run several sessions without cross-talk. Submissions are optimistic: the
/// user message lands and the input clears before the network resolves, and
/// the response continuation arrives later through `poll_responses`.
pub struct ChatSession {
    id: Uuid,
    store: ConversationStore,
    composer: ChatComposer,
    scroll: ScrollSync,
    visibility: Visibility,
    client: RagClient,
    outcome_tx: mpsc::UnboundedSender<DispatchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<DispatchOutcome>,
    in_flight: usize,
}

impl ChatSession {
    pub fn new(client: RagClient) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4(),
            store: ConversationStore::new(),
            composer: ChatComposer::new(COMPOSER_PLACEHOLDER),
            scroll: ScrollSync::new(),
            visibility: Visibility::Closed,
            client,
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_open(&self) -> bool {
        self.visibility == Visibility::Open
    }

    /// Flip the overlay. History is untouched.
    pub fn toggle(&mut self) {
        match self.visibility {
            Visibility::Closed => self.open(),
            Visibility::Open => self.close(),
        }
    }

    pub fn open(&mut self) {
        self.visibility = Visibility::Open;
        self.composer.set_focus(true);
    }

    /// Force-close. No-op when already closed.
    pub fn close(&mut self) {
        self.visibility = Visibility::Closed;
        self.composer.set_focus(false);
    }

    /// Ordered conversation history, oldest first.
    pub fn history(&self) -> &[Message] {
        self.store.messages()
    }

    /// Text typed but not yet submitted.
    pub fn pending_input(&self) -> &str {
        self.composer.content()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Reset the history to the welcome message. In-flight responses from
    /// before the reset are discarded when they arrive.
    pub fn reset(&mut self) {
        self.store.initialize();
    }

    /// Route a key press into the composer; Enter submits.
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => self.submit(&input),
            ComposerResult::None => {}
        }
    }

    /// Submission flow: validate, append the user message, clear the pending
    /// input, fire the dispatch. Empty or whitespace-only input is a no-op.
    pub fn submit(&mut self, input: &str) {
        let query = input.trim();
        if query.is_empty() {
            return;
        }
        let query = query.to_string();

        self.store.append(Message::user(query.clone()));
        self.composer.clear();

        let request_id = Uuid::new_v4();
        let generation = self.store.generation();
        let client = self.client.clone();
        let tx = self.outcome_tx.clone();
        self.in_flight += 1;
        tracing::debug!(session = %self.id, %request_id, "dispatching submission");

        tokio::spawn(async move {
            let result = client.send(&query).await;
            // The session may already be gone; then nobody is listening.
            let _ = tx.send(DispatchOutcome {
                request_id,
                generation,
                result,
            });
        });
    }

    /// Drain resolved dispatches. Called from the event loop between turns,
    /// so appends never interleave with other state mutations.
    pub fn poll_responses(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    /// Apply one resolved dispatch: exactly one assistant message per
    /// submission, the verbatim answer or the fixed fallback. A response
    /// tagged with a retired generation is dropped.
    pub fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if outcome.generation != self.store.generation() {
            tracing::warn!(
                session = %self.id,
                request_id = %outcome.request_id,
                "discarding response for a retired history"
            );
            return;
        }

        let text = match outcome.result {
            Ok(answer) => answer,
            Err(error) => {
                tracing::warn!(
                    session = %self.id,
                    request_id = %outcome.request_id,
                    %error,
                    "dispatch failed"
                );
                FALLBACK_TEXT.to_string()
            }
        };
        self.store.append(Message::assistant(text));
    }

    /// Advance the scroll animation one tick.
    pub fn tick(&mut self) {
        self.scroll.tick();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll.scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll.scroll_down(lines);
    }

    /// Draw the overlay. Does nothing while closed.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if !self.is_open() {
            return;
        }

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(OVERLAY_TITLE)
            .style(Style::default().fg(Color::White));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // transcript
                Constraint::Length(1), // status line
                Constraint::Length(3), // composer
            ])
            .split(inner);

        let lines = history::layout(self.store.messages(), chunks[0].width);
        self.scroll
            .observe(self.store.revision(), lines.len(), chunks[0].height as usize);
        TranscriptView::new(&lines, self.scroll.offset()).render(chunks[0], buf);

        if self.in_flight > 0 && chunks[1].height > 0 {
            let indicator = Line::from(vec![
                Span::styled("🤖 ", Style::default().fg(Color::Green)),
                Span::styled("Academ.ia está pensando...", Style::default().fg(Color::Green)),
            ]);
            buf.set_line(chunks[1].x, chunks[1].y, &indicator, chunks[1].width);
        }

        (&self.composer).render(chunks[2], buf);
    }
}
