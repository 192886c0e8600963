//! Host application: the portal stand-in that mounts the chat overlay.

use crate::backend::RagClient;
use crate::events::TuiEvent;
use crate::tui::{EventHandler, Tui};
use crate::ui::chat::ChatSession;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Lines jumped per page-scroll key.
const SCROLL_STEP: usize = 5;

pub struct App {
    session: ChatSession,
    should_quit: bool,
}

impl App {
    pub fn new(client: RagClient) -> Self {
        Self {
            session: ChatSession::new(client),
            should_quit: false,
        }
    }

    /// Main loop: draw, wait for one event, handle it. Every state mutation
    /// happens inside one turn of this loop.
    pub async fn run(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventHandler::new();

        while !self.should_quit {
            self.session.poll_responses();
            terminal.draw(|frame| self.draw(frame))?;

            match events.next().await {
                Some(TuiEvent::Key(key)) => self.handle_key(key),
                Some(TuiEvent::Tick) => self.session.tick(),
                Some(TuiEvent::Resize(_, _)) => {}
                None => break,
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.session.is_open() {
            match key.code {
                KeyCode::Esc => self.session.close(),
                KeyCode::Tab => self.session.toggle(),
                KeyCode::PageUp => self.session.scroll_up(SCROLL_STEP),
                KeyCode::PageDown => self.session.scroll_down(SCROLL_STEP),
                KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.session.reset()
                }
                _ => self.session.handle_key(key),
            }
        } else {
            match key.code {
                KeyCode::Char('i') | KeyCode::Tab => self.session.toggle(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        self.draw_host(frame, area);

        let overlay = centered_rect(area, 70, 80);
        self.session.render(overlay, frame.buffer_mut());
    }

    /// Static portal chrome. Purely presentational; the chat session is the
    /// only part with state.
    fn draw_host(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(area);

        let header = Paragraph::new(Line::from(Span::styled(
            "Portal de Periódicos da CAPES",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(header, chunks[0]);

        let body = Paragraph::new(vec![
            Line::default(),
            Line::from(Span::styled(
                "🤖 Academ.ia",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Sua assistente virtual para pesquisa acadêmica",
                Style::default().fg(Color::Gray),
            )),
            Line::default(),
            Line::from(Span::styled(
                "Para uma melhor experiência de busca, utilize a nossa IA!",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(body, chunks[1]);

        let hint = if self.session.is_open() {
            "Enter envia · Esc fecha · PgUp/PgDn rolam · Ctrl+L reinicia"
        } else {
            "i abre a assistente · q sai"
        };
        let footer = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(footer, chunks[2]);
    }
}

/// Centered sub-rectangle taking the given percentages of the area.
fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
