//! Input line for the chat overlay.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    None,
}

/// Pending-input buffer plus the widget that displays it.
///
/// The buffer is cleared on submission, before the network result is known.
/// Enter on an empty or whitespace-only buffer is ignored and leaves the
/// buffer untouched.
#[derive(Debug, Clone)]
pub struct ChatComposer {
    content: String,
    /// Byte offset into `content`, always on a char boundary.
    cursor: usize,
    placeholder: String,
    has_focus: bool,
}

impl ChatComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            has_focus: false,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if !self.content.trim().is_empty() {
                    let content = std::mem::take(&mut self.content);
                    self.cursor = 0;
                    return ComposerResult::Submitted(content);
                }
            }
            KeyCode::Char(c) => {
                self.content.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            KeyCode::Backspace => {
                if let Some(prev) = self.prev_boundary() {
                    self.content.remove(prev);
                    self.cursor = prev;
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.content.len() {
                    self.content.remove(self.cursor);
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.prev_boundary() {
                    self.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.next_boundary() {
                    self.cursor = next;
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = self.content.len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor].char_indices().last().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Current pending input
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }
}

impl Widget for &ChatComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);
        if inner_area.height == 0 {
            return;
        }

        if self.content.is_empty() && !self.has_focus {
            let placeholder_line = Line::from(Span::styled(
                self.placeholder.clone(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.has_focus {
                content.insert(self.cursor.min(content.len()), '▌');
            }
            let line = Line::from(Span::raw(content));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, KeyModifiers};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn type_str(composer: &mut ChatComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_and_clears_the_buffer() {
        let mut composer = ChatComposer::new("Digite sua pergunta...");
        type_str(&mut composer, "o que é IA?");

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Submitted("o que é IA?".to_string()));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn enter_on_whitespace_is_a_noop_and_keeps_the_buffer() {
        let mut composer = ChatComposer::new("");
        type_str(&mut composer, "   ");

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut composer = ChatComposer::new("");
        type_str(&mut composer, "pesquisa acadêmica");

        composer.handle_key(press(KeyCode::Backspace));
        composer.handle_key(press(KeyCode::Backspace));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "pesquisa acadêm");

        composer.handle_key(press(KeyCode::Backspace));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "pesquisa acad");
    }

    #[test]
    fn cursor_movement_stays_on_char_boundaries() {
        let mut composer = ChatComposer::new("");
        type_str(&mut composer, "çã");

        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Char('x')));
        assert_eq!(composer.content(), "çxã");

        composer.handle_key(press(KeyCode::Home));
        composer.handle_key(press(KeyCode::Delete));
        assert_eq!(composer.content(), "xã");
    }
}
