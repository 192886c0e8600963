//! Rendering policy for chat messages.
//!
//! User text is always rendered literally. Assistant text arrives from the
//! backend as a rich-text fragment and goes through a sanitizing renderer:
//! only an allow-list of formatting tags survives, `script`/`style` elements
//! are dropped together with their content, and attributes are never
//! interpreted, so nothing executable can reach the view.

use once_cell::sync::Lazy;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::collections::HashSet;

/// Formatting tags the renderer understands. Anything else is stripped while
/// its children are kept.
static ALLOWED_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "p", "br", "strong", "b", "em", "i", "u", "ul", "ol", "li", "a",
    ]
    .into_iter()
    .collect()
});

/// Elements whose entire content is discarded.
static DROPPED_TAGS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["script", "style"].into_iter().collect());

/// Render plain user text. Never parsed as markup.
pub fn render_user(text: &str, base: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|l| Line::from(Span::styled(l.to_string(), base)))
        .collect()
}

/// Render an assistant markup fragment into styled lines.
pub fn render_assistant(fragment: &str, base: Style) -> Vec<Line<'static>> {
    Renderer::new(base).run(fragment)
}

/// Sanitized fragment flattened to plain text, one paragraph per line.
pub fn plain_text(fragment: &str) -> String {
    let lines = render_assistant(fragment, Style::default());
    let flat: Vec<String> = lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|s| s.content.as_ref())
                .collect::<String>()
        })
        .collect();
    flat.join("\n").trim_matches('\n').to_string()
}

enum ListKind {
    Unordered,
    Ordered(u32),
}

struct Renderer {
    base: Style,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    bold: u32,
    italic: u32,
    underline: u32,
    lists: Vec<ListKind>,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            current: Vec::new(),
            bold: 0,
            italic: 0,
            underline: 0,
            lists: Vec::new(),
        }
    }

    fn run(mut self, fragment: &str) -> Vec<Line<'static>> {
        let mut rest = fragment;
        while let Some(lt) = rest.find('<') {
            self.push_text(&rest[..lt]);
            rest = &rest[lt..];
            match rest[1..].find('>') {
                Some(gt) => {
                    let raw = &rest[1..gt + 1];
                    rest = &rest[gt + 2..];
                    rest = self.handle_tag(raw, rest);
                }
                None => {
                    // Unterminated tag: render the remainder literally.
                    self.push_text(rest);
                    rest = "";
                }
            }
        }
        self.push_text(rest);
        self.flush_line();
        while self.lines.last().is_some_and(|l| l.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    /// Apply one tag. Returns the remaining input, which lets dropped
    /// elements consume everything up to their closing tag.
    fn handle_tag<'a>(&mut self, raw: &str, rest: &'a str) -> &'a str {
        let closing = raw.starts_with('/');
        let name_part = raw.trim_start_matches('/').trim_end_matches('/');
        let name = name_part
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        if !closing && DROPPED_TAGS.contains(name.as_str()) {
            return skip_dropped_element(&name, rest);
        }
        if !ALLOWED_TAGS.contains(name.as_str()) {
            return rest;
        }

        match (name.as_str(), closing) {
            ("br", _) => self.flush_line(),
            ("p", false) | ("ul", false) | ("ol", false) => {
                self.start_block();
                match name.as_str() {
                    "ul" => self.lists.push(ListKind::Unordered),
                    "ol" => self.lists.push(ListKind::Ordered(0)),
                    _ => {}
                }
            }
            ("p", true) => self.flush_line(),
            ("ul", true) | ("ol", true) => {
                self.flush_line();
                self.lists.pop();
            }
            ("li", false) => {
                self.flush_line();
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        *n += 1;
                        format!("  {}. ", n)
                    }
                    _ => "  • ".to_string(),
                };
                self.current.push(Span::styled(marker, self.base));
            }
            ("li", true) => self.flush_line(),
            ("strong", false) | ("b", false) => self.bold += 1,
            ("strong", true) | ("b", true) => self.bold = self.bold.saturating_sub(1),
            ("em", false) | ("i", false) => self.italic += 1,
            ("em", true) | ("i", true) => self.italic = self.italic.saturating_sub(1),
            ("u", false) | ("a", false) => self.underline += 1,
            ("u", true) | ("a", true) => self.underline = self.underline.saturating_sub(1),
            _ => {}
        }
        rest
    }

    fn style(&self) -> Style {
        let mut style = self.base;
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.underline > 0 {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let decoded = decode_entities(text);
        let collapsed = collapse_whitespace(&decoded, self.current.is_empty());
        if collapsed.is_empty() {
            return;
        }
        self.current.push(Span::styled(collapsed, self.style()));
    }

    fn flush_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        if spans.iter().all(|s| s.content.trim().is_empty()) {
            return;
        }
        self.lines.push(Line::from(spans));
    }

    /// Close the current line and separate from the previous block with one
    /// blank line.
    fn start_block(&mut self) {
        self.flush_line();
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

/// Skip everything up to and including `</name>`. If the element is never
/// closed the rest of the fragment is discarded with it.
fn skip_dropped_element<'a>(name: &str, rest: &'a str) -> &'a str {
    let lower = rest.to_ascii_lowercase();
    let needle = format!("</{}", name);
    match lower.find(&needle) {
        Some(pos) => match rest[pos..].find('>') {
            Some(gt) => &rest[pos + gt + 1..],
            None => "",
        },
        None => "",
    }
}

/// Collapse whitespace runs the way an HTML renderer would. A run at the
/// start of a line is dropped entirely.
fn collapse_whitespace(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = at_line_start;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Decode the character entities that show up in backend fragments.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let semi = match rest.find(';') {
            // Entities are short; a far-away semicolon means a bare ampersand.
            Some(pos) if pos <= 8 => pos,
            _ => {
                out.push('&');
                rest = &rest[1..];
                continue;
            }
        };
        let entity = &rest[1..semi];
        match decode_entity(entity) {
            Some(ch) => out.push(ch),
            None => out.push_str(&rest[..semi + 1]),
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or(entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::chat::store::WELCOME_HTML;
    use pretty_assertions::assert_eq;

    fn flat(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn user_text_is_literal_even_when_it_looks_like_markup() {
        let lines = render_user("<script>alert(1)</script>", Style::default());
        assert_eq!(flat(&lines), vec!["<script>alert(1)</script>"]);
    }

    #[test]
    fn welcome_fragment_renders_all_paragraphs_and_bullets() {
        let text = plain_text(WELCOME_HTML);
        assert!(text.starts_with("Bem-vindo ao Portal de Periódicos da CAPES com IA!"));
        assert!(text.contains("• Buscar artigos sobre inteligência artificial"));
        assert!(text.contains("• Responder perguntas sobre conteúdo específico"));
        assert!(text.contains("• Fornecer informações sobre pesquisas acadêmicas"));
        assert!(text.ends_with("Como posso te ajudar hoje?"));
    }

    #[test]
    fn script_elements_are_dropped_with_their_content() {
        let fragment = "<p>antes</p><script>alert('xss')</script><p>depois</p>";
        let text = plain_text(fragment);
        assert_eq!(text, "antes\n\ndepois");
        assert!(!text.contains("alert"));
    }

    #[test]
    fn style_elements_are_dropped_with_their_content() {
        let text = plain_text("<style>body { display: none }</style><p>ok</p>");
        assert_eq!(text, "ok");
    }

    #[test]
    fn unknown_tags_are_stripped_but_children_survive() {
        let text = plain_text("<div onclick=\"evil()\"><p>conteúdo</p></div>");
        assert_eq!(text, "conteúdo");
        assert!(!text.contains("evil"));
    }

    #[test]
    fn unclosed_script_discards_the_remainder() {
        let text = plain_text("<p>ok</p><script>alert(1)");
        assert_eq!(text, "ok");
    }

    #[test]
    fn strong_maps_to_bold_spans() {
        let lines = render_assistant("<p>um <strong>dois</strong> três</p>", Style::default());
        let bold: Vec<&Span> = lines[0]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .collect();
        assert_eq!(bold.len(), 1);
        assert_eq!(bold[0].content.as_ref(), "dois");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(plain_text("<p>a &amp; b &lt;c&gt; &#233;</p>"), "a & b <c> é");
    }

    #[test]
    fn ordered_lists_are_numbered() {
        let text = plain_text("<ol><li>um</li><li>dois</li></ol>");
        assert_eq!(text, "  1. um\n  2. dois");
    }

    #[test]
    fn bare_text_without_markup_passes_through() {
        assert_eq!(plain_text("resposta simples"), "resposta simples");
    }
}
