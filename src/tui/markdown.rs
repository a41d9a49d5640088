//! Markdown → ratatui `Text` renderer for assistant replies.
//!
//! Replies are first re-spaced (`respace`) so section separators the model
//! glues onto surrounding text still parse as blocks, then fed through
//! `pulldown_cmark` and converted into styled `Line`/`Span` values.
//! Headings, emphasis, inline code, fenced code blocks, lists, blockquotes,
//! rules and links are supported.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

const RULE_WIDTH: usize = 32;

/// Puts `---` rules and `###` headings on their own blocks and collapses
/// runs of blank lines.
///
/// Streamed replies often arrive as `"intro---### Details"`, which markdown
/// would otherwise read as plain text.
pub fn respace(content: &str) -> String {
    let ruled = replace_marker(content, "---", "\n\n---\n\n");
    let spaced = replace_marker(&ruled, "###", "\n\n### ");
    collapse_blank_runs(&spaced)
}

/// Replaces every `marker` and the whitespace that follows it.
fn replace_marker(text: &str, marker: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(marker) {
        out.push_str(&rest[..pos]);
        out.push_str(replacement);
        rest = rest[pos + marker.len()..].trim_start();
    }
    out.push_str(rest);
    out
}

/// Three or more consecutive newlines become exactly two.
fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;
    for c in text.chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(c);
            }
        } else {
            newlines = 0;
            out.push(c);
        }
    }
    out
}

/// Parse a reply into styled `Text` using Koko's color scheme.
///
/// Returns owned text (`'static`) so callers aren't constrained by input lifetime.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let prepared = respace(content);
    let mut w = Writer::new(base_fg);
    for event in Parser::new_ext(prepared.trim(), opts) {
        w.handle(event);
    }
    w.text
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// Inline style stack; styles compose via `patch` so bold+italic nests.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote and code block gutters).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    in_code_block: bool,
    link_url: Option<String>,
    needs_blank_line: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            in_code_block: false,
            link_url: None,
            needs_blank_line: false,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        match self.text.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.push_line(Line::from(vec![span])),
        }
    }

    fn start_block(&mut self) {
        if self.needs_blank_line {
            self.push_line(Line::default());
            self.needs_blank_line = false;
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.push_span(Span::styled(c.to_string(), style));
            }
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.push_line(Line::default()),
            Event::Rule => {
                self.start_block();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(RULE_WIDTH),
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_blank_line = true;
            }
            Event::TaskListMarker(checked) => {
                self.push_span(Span::raw(if checked { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.start_block();
                self.push_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                let hs = heading_style(self.base_fg, level);
                self.push_line(Line::default());
                // Heading text inherits the heading style, not just the marker
                self.push_style(hs);
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.line_prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.line_prefixes
                    .push(Span::styled("┃ ", Style::default().fg(Color::DarkGray)));
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.list_indices.is_empty() {
                    self.start_block();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.push_line(Line::default());
                let indent = "  ".repeat(self.list_indices.len().saturating_sub(1));
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}• "),
                        Some(n) => {
                            let s = format!("{indent}{n}. ");
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                }
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.needs_blank_line = true,
            TagEnd::Heading(_) => {
                self.pop_style();
                self.needs_blank_line = true;
            }
            TagEnd::BlockQuote(_) => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_blank_line = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.line_prefixes.pop();
                self.needs_blank_line = true;
            }
            TagEnd::List(_) => {
                self.list_indices.pop();
                self.needs_blank_line = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style();
                // Bare autolinks already show the URL as their text
                if let Some(url) = self.link_url.take()
                    && !self.last_span_is(&url)
                {
                    self.push_span(Span::styled(
                        format!(" <{url}>"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn last_span_is(&self, content: &str) -> bool {
        self.text
            .lines
            .last()
            .and_then(|l| l.spans.last())
            .is_some_and(|s| s.content == content)
    }

    fn text(&mut self, cow: CowStr<'_>) {
        // ratatui renders \t as zero-width
        let text = cow.replace('\t', "    ");

        if self.in_code_block {
            let code_style = Style::default().fg(Color::White);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return;
        }

        let style = self.style();
        self.push_span(Span::styled(text, style));
    }
}

fn heading_style(base_fg: Color, level: HeadingLevel) -> Style {
    let style = Style::default().fg(base_fg).add_modifier(Modifier::BOLD);
    match level {
        HeadingLevel::H1 => style.add_modifier(Modifier::UNDERLINED),
        HeadingLevel::H2 => style,
        _ => style.add_modifier(Modifier::ITALIC),
    }
}
