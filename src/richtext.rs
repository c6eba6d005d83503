use std::collections::HashSet;

use once_cell::sync::Lazy;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::layout::Alignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use regex::{Captures, Regex};

/// Character cap of the collapsed description form.
pub const SHORT_DESCRIPTION_CHARS: usize = 200;
/// Character cap of the expanded description form.
pub const EXPANDED_DESCRIPTION_CHARS: usize = 450;

/// Renders a story body (markdown-flavoured rich text) into styled terminal
/// lines. Descriptions are short article bodies, so this keeps paragraphs,
/// headings, emphasis runs, lists and quotes; raw HTML is dropped and links
/// are scrubbed down to their label.
#[derive(Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, input: &str) -> Text<'static> {
        let (scrubbed, _links) = scrub_links(input);
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_STRIKETHROUGH);

        let parser = Parser::new_ext(&scrubbed, opts);
        let mut writer = BodyWriter::default();
        writer.render(parser);
        writer.into_text()
    }

    /// Renders a body and clips the result to a character cap, ending the
    /// overflowing line with an ellipsis. Used for the expanded description
    /// form, which is still bounded.
    pub fn render_clipped(&self, input: &str, char_limit: usize) -> Text<'static> {
        let full = self.render(input);
        let mut used = 0usize;
        let mut lines = Vec::new();
        for line in full.lines {
            let line_chars: usize = line
                .spans
                .iter()
                .map(|span| span.content.chars().count())
                .sum();
            if used + line_chars <= char_limit {
                used += line_chars;
                lines.push(line);
                continue;
            }
            let remaining = char_limit.saturating_sub(used);
            let flat: String = line
                .spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect();
            let style = line.spans.first().map(|span| span.style).unwrap_or_default();
            lines.push(Line::from(Span::styled(
                truncate_chars(&flat, remaining),
                style,
            )));
            break;
        }
        if lines.is_empty() {
            lines.push(Line::from(Span::raw("")));
        }
        Text {
            lines,
            alignment: Some(Alignment::Left),
            style: Style::default(),
        }
    }
}

#[derive(Default)]
struct BodyWriter {
    lines: Vec<RenderLine>,
    buffer: String,
    list_depth: usize,
    in_item: bool,
    blockquote_depth: usize,
    heading_level: Option<u8>,
}

#[derive(Clone)]
enum RenderLine {
    Text(String),
    Heading { level: u8, text: String },
    Bullet { indent: usize, text: String },
    Quote { depth: usize, text: String },
    Separator,
}

impl BodyWriter {
    fn render<'a, I>(&mut self, parser: I)
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in parser {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag) => self.end_tag(tag),
                Event::Text(text) => self.append_text(text),
                Event::Code(code) => self.append_text(code),
                Event::Html(_) | Event::InlineHtml(_) => {}
                Event::HardBreak => self.append_text("\n"),
                Event::SoftBreak => self.append_text(" "),
                Event::Rule => {
                    self.flush_buffer();
                    self.lines.push(RenderLine::Separator);
                }
                _ => {}
            }
        }
        self.flush_buffer();
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.flush_buffer(),
            Tag::Heading { level, .. } => {
                self.flush_buffer();
                self.heading_level = Some(level_to_u8(level));
            }
            Tag::BlockQuote => {
                self.flush_buffer();
                self.blockquote_depth += 1;
            }
            Tag::List(_) => self.list_depth += 1,
            Tag::Item => {
                self.flush_buffer();
                self.in_item = true;
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush_buffer();
                self.lines.push(RenderLine::Separator);
            }
            TagEnd::Heading(_) => {
                if let Some(level) = self.heading_level.take() {
                    let text = self.consume_buffer();
                    if !text.is_empty() {
                        self.lines.push(RenderLine::Heading { level, text });
                        self.lines.push(RenderLine::Separator);
                    }
                }
            }
            TagEnd::BlockQuote => {
                self.flush_buffer();
                self.blockquote_depth = self.blockquote_depth.saturating_sub(1);
                self.lines.push(RenderLine::Separator);
            }
            TagEnd::List(_) => {
                self.flush_buffer();
                self.list_depth = self.list_depth.saturating_sub(1);
                self.lines.push(RenderLine::Separator);
            }
            TagEnd::Item => {
                self.flush_buffer();
                self.in_item = false;
            }
            _ => {}
        }
    }

    fn append_text<T: AsRef<str>>(&mut self, text: T) {
        self.buffer.push_str(text.as_ref());
    }

    fn flush_buffer(&mut self) {
        let text = self.consume_buffer();
        if text.is_empty() {
            return;
        }

        if let Some(level) = self.heading_level {
            self.lines.push(RenderLine::Heading { level, text });
            return;
        }

        if self.in_item {
            self.lines.push(RenderLine::Bullet {
                indent: self.list_depth.saturating_sub(1),
                text,
            });
            return;
        }

        if self.blockquote_depth > 0 {
            self.lines.push(RenderLine::Quote {
                depth: self.blockquote_depth,
                text,
            });
            return;
        }

        self.lines.push(RenderLine::Text(text));
    }

    fn consume_buffer(&mut self) -> String {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        text
    }

    fn into_text(mut self) -> Text<'static> {
        while matches!(self.lines.last(), Some(RenderLine::Separator)) {
            self.lines.pop();
        }

        let mut styled_lines = Vec::with_capacity(self.lines.len());
        for line in self.lines {
            match line {
                RenderLine::Text(content) => styled_lines.push(Line::from(Span::raw(content))),
                RenderLine::Heading { level, text } => {
                    styled_lines.push(Line::from(Span::styled(text, heading_style(level))));
                }
                RenderLine::Bullet { indent, text } => {
                    styled_lines.push(Line::from(vec![
                        Span::raw("  ".repeat(indent)),
                        Span::styled("• ", Style::default().fg(Color::Yellow)),
                        Span::raw(text),
                    ]));
                }
                RenderLine::Quote { depth, text } => {
                    let prefix = ">".repeat(depth.max(1));
                    styled_lines.push(Line::from(vec![
                        Span::styled(prefix + " ", Style::default().fg(Color::Green)),
                        Span::styled(text, Style::default().fg(Color::Green)),
                    ]));
                }
                RenderLine::Separator => styled_lines.push(Line::default()),
            }
        }

        if styled_lines.is_empty() {
            styled_lines.push(Line::from(Span::raw("")));
        }

        Text {
            lines: styled_lines,
            alignment: Some(Alignment::Left),
            style: Style::default(),
        }
    }
}

fn heading_style(level: u8) -> Style {
    match level {
        1 | 2 => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Magenta),
    }
}

fn level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Replaces markdown links by their label and bare URLs by `[link]`,
/// returning the scrubbed text plus the collected URLs in order of first
/// appearance.
pub fn scrub_links(text: &str) -> (String, Vec<String>) {
    static MARKDOWN_LINK_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
    });
    static BARE_URL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)https?://[^\s)]+").expect("valid bare url regex"));

    if text.trim().is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut seen = HashSet::new();
    let mut links: Vec<String> = Vec::new();

    let intermediate = MARKDOWN_LINK_RE
        .replace_all(text, |caps: &Captures| {
            let url = caps[2].to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
            caps[1].to_string()
        })
        .to_string();

    let sanitized = BARE_URL_RE
        .replace_all(&intermediate, |caps: &Captures| {
            let url = caps[0].to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
            "[link]".to_string()
        })
        .to_string();

    (sanitized, links)
}

/// Flattens a story body to plain prose (markdown markers stripped,
/// paragraphs joined by spaces) for the truncated HUD forms.
pub fn plain_text(input: &str) -> String {
    let (scrubbed, _links) = scrub_links(input);
    let parser = Parser::new_ext(&scrubbed, Options::empty());
    let mut out = String::new();
    for event in parser {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph) | Event::End(TagEnd::Item) => {
                if !out.ends_with(' ') && !out.is_empty() {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Char-boundary-safe truncation with an ellipsis continuation marker.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("hola", 10), "hola");
    }

    #[test]
    fn exact_limit_is_untouched() {
        assert_eq!(truncate_chars("abcde", 5), "abcde");
    }

    #[test]
    fn long_text_gets_an_ellipsis() {
        assert_eq!(truncate_chars("abcdefgh", 5), "abcde…");
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        // Multibyte chars must not split mid-codepoint.
        let text = "ñandú ñandú";
        let cut = truncate_chars(text, 7);
        assert_eq!(cut, "ñandú ñ…");
    }

    #[test]
    fn truncation_trims_trailing_whitespace_before_ellipsis() {
        assert_eq!(truncate_chars("abc def", 4), "abc…");
    }

    #[test]
    fn renderer_produces_paragraph_lines() {
        let text = Renderer::new().render("Primer párrafo.\n\nSegundo párrafo.");
        let flat: Vec<String> = text
            .lines
            .iter()
            .map(|line| {
                line.spans
                    .iter()
                    .map(|span| span.content.as_ref())
                    .collect::<String>()
            })
            .collect();
        assert!(flat.contains(&"Primer párrafo.".to_string()));
        assert!(flat.contains(&"Segundo párrafo.".to_string()));
    }

    #[test]
    fn renderer_scrubs_markdown_links_to_their_label() {
        let text = Renderer::new().render("Lee [el informe](https://noticias.lat/doc) completo.");
        let flat: String = text
            .lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.as_ref())
            .collect();
        assert!(flat.contains("el informe"));
        assert!(!flat.contains("https://"));
    }

    #[test]
    fn scrub_links_collects_urls_in_order() {
        let (sanitized, links) = scrub_links(
            "Mira [esto](https://a.test/uno) y también https://b.test/dos por favor",
        );
        assert_eq!(sanitized, "Mira esto y también [link] por favor");
        assert_eq!(links, vec!["https://a.test/uno", "https://b.test/dos"]);
    }

    #[test]
    fn render_clipped_bounds_the_expanded_form() {
        let body = "Primera línea con bastante texto.\n\nSegunda línea también larga.";
        let clipped = Renderer::new().render_clipped(body, 40);
        let total: usize = clipped
            .lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .map(|span| span.content.chars().count())
            .sum();
        // The cap plus at most one ellipsis.
        assert!(total <= 41, "clipped output used {total} chars");
    }

    #[test]
    fn plain_text_joins_paragraphs() {
        assert_eq!(
            plain_text("Uno.\n\nDos **tres**."),
            "Uno. Dos tres."
        );
    }
}
