//! Transcript layout and display for the chat overlay.

use crate::markup;
use crate::ui::chat::store::{Message, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// Lay out the full transcript for the given width.
///
/// Each message becomes a dim header line, its rendered content wrapped and
/// indented, and one spacing line. The caller reports `len()` of the result
/// to the scroll synchronizer, so the measured layout and the drawn layout
/// are always the same.
pub fn layout(messages: &[Message], width: u16) -> Vec<Line<'static>> {
    let content_width = width.saturating_sub(2).max(1) as usize;
    let mut all_lines = Vec::new();

    for message in messages {
        all_lines.push(header_line(message));

        let style = content_style(message.sender);
        let rendered = match message.sender {
            Sender::User => markup::render_user(&message.text, style),
            Sender::Assistant => markup::render_assistant(&message.text, style),
        };

        for line in &rendered {
            for wrapped in wrap_line(line, content_width) {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(wrapped.spans);
                all_lines.push(Line::from(spans));
            }
        }

        // spacing between messages
        all_lines.push(Line::default());
    }

    all_lines
}

fn header_line(message: &Message) -> Line<'static> {
    let icon = match message.sender {
        Sender::User => "👤",
        Sender::Assistant => "🤖",
    };
    let timestamp = message.timestamp.format("%H:%M:%S").to_string();
    let header = format!("{} {} {}", icon, timestamp, "─".repeat(20));
    Line::from(Span::styled(header, Style::default().fg(Color::DarkGray)))
}

fn content_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Blue),
        Sender::Assistant => Style::default().fg(Color::Green),
    }
}

/// Wrap one styled line to `width` columns, keeping span styles intact.
fn wrap_line(line: &Line<'_>, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;
    // A word may cross span boundaries, so collect its styled pieces.
    let mut word: Vec<(Style, String)> = Vec::new();
    let mut word_width = 0usize;
    let mut pending_space = false;

    let mut commit_word = |current: &mut Vec<Span<'static>>,
                           current_width: &mut usize,
                           word: &mut Vec<(Style, String)>,
                           word_width: &mut usize,
                           pending_space: &mut bool,
                           lines: &mut Vec<Line<'static>>| {
        if word.is_empty() {
            return;
        }
        let space = if *current_width > 0 && *pending_space { 1 } else { 0 };
        if *current_width > 0 && *current_width + space + *word_width > width {
            lines.push(Line::from(std::mem::take(current)));
            *current_width = 0;
        } else if space == 1 {
            current.push(Span::raw(" "));
            *current_width += 1;
        }
        for (style, text) in word.drain(..) {
            *current_width += text.chars().count();
            current.push(Span::styled(text, style));
        }
        *word_width = 0;
        *pending_space = false;
    };

    for span in &line.spans {
        for ch in span.content.chars() {
            if ch == ' ' {
                commit_word(
                    &mut current,
                    &mut current_width,
                    &mut word,
                    &mut word_width,
                    &mut pending_space,
                    &mut lines,
                );
                pending_space = true;
            } else {
                match word.last_mut() {
                    Some((style, text)) if *style == span.style => text.push(ch),
                    _ => word.push((span.style, ch.to_string())),
                }
                word_width += 1;
            }
        }
    }
    commit_word(
        &mut current,
        &mut current_width,
        &mut word,
        &mut word_width,
        &mut pending_space,
        &mut lines,
    );

    if !current.is_empty() {
        lines.push(Line::from(current));
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Visible window of a laid-out transcript.
pub struct TranscriptView<'a> {
    lines: &'a [Line<'static>],
    offset: usize,
}

impl<'a> TranscriptView<'a> {
    pub fn new(lines: &'a [Line<'static>], offset: usize) -> Self {
        Self { lines, offset }
    }
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let start = self.offset.min(self.lines.len());
        for (i, line) in self
            .lines
            .iter()
            .skip(start)
            .take(area.height as usize)
            .enumerate()
        {
            buf.set_line(area.x, area.y + i as u16, line, area.width);
        }
    }
}
