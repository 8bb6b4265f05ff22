use crate::document::model::{Block, List, ListType, PreviewModel, Run, RunStyle};

const INDENT_STEP: i32 = 20;
const TAB: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Body,
    Heading(u8),
    Code,
    Quote,
}

impl FontKind {
    /// Pixel height at 96 DPI.
    pub fn height(self) -> i32 {
        match self {
            Self::Heading(1) => 30,
            Self::Heading(2) => 24,
            Self::Heading(3) => 20,
            Self::Heading(_) => 17,
            Self::Body | Self::Quote => 16,
            Self::Code => 15,
        }
    }

    pub fn bold(self) -> bool {
        matches!(self, Self::Heading(_))
    }

    pub fn italic(self) -> bool {
        matches!(self, Self::Quote)
    }

    pub fn monospace(self) -> bool {
        matches!(self, Self::Code)
    }

    /// The concrete font for a run of `style` inside a block of this kind.
    pub fn with_style(self, style: RunStyle) -> FontSpec {
        FontSpec {
            height: self.height(),
            bold: self.bold() || style.bold,
            italic: self.italic() || style.italic,
            monospace: self.monospace() || style.monospace,
            underline: style.link,
            strikeout: style.strikethrough,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSpec {
    pub height: i32,
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
    pub underline: bool,
    pub strikeout: bool,
}

/// Text sharing one inline style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: RunStyle,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }
}

/// One paintable block of the preview, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaintItem {
    Text {
        font: FontKind,
        indent: i32,
        spans: Vec<Span>,
        shaded: bool,
    },
    Rule,
}

pub fn layout(model: &PreviewModel) -> Vec<PaintItem> {
    if model.is_empty() {
        return Vec::new();
    }
    let mut items = Vec::new();
    for block in &model.content {
        layout_block(block, 0, false, &mut items);
    }
    items
}

fn layout_block(block: &Block, indent: i32, quoted: bool, out: &mut Vec<PaintItem>) {
    let body = if quoted { FontKind::Quote } else { FontKind::Body };
    match block {
        Block::Paragraph(p) => out.push(PaintItem::Text {
            font: body,
            indent,
            spans: spans(&p.runs),
            shaded: false,
        }),
        Block::Heading(h) => out.push(PaintItem::Text {
            font: FontKind::Heading(h.level),
            indent,
            spans: spans(&h.runs),
            shaded: false,
        }),
        Block::CodeBlock(c) => out.push(PaintItem::Text {
            font: FontKind::Code,
            indent,
            spans: vec![Span::plain(c.code.trim_end_matches('\n').replace('\t', TAB))],
            shaded: true,
        }),
        Block::List(list) => layout_list(list, indent, body, out),
        Block::BlockQuote(q) => {
            for nested in &q.blocks {
                layout_block(nested, indent + INDENT_STEP, true, out);
            }
        }
        Block::HorizontalRule => out.push(PaintItem::Rule),
    }
}

fn layout_list(list: &List, indent: i32, font: FontKind, out: &mut Vec<PaintItem>) {
    for (index, item) in list.items.iter().enumerate() {
        let marker = match (item.checked, list.list_type) {
            (Some(true), _) => "[x]".to_string(),
            (Some(false), _) => "[ ]".to_string(),
            (None, ListType::Bullet) => "\u{2022}".to_string(),
            (None, ListType::Numbered) => format!("{}.", list.start_number + index as u64),
        };
        let mut line = vec![Span::plain(format!("{marker} "))];
        line.extend(spans(&item.runs));
        out.push(PaintItem::Text {
            font,
            indent: indent + INDENT_STEP,
            spans: merge(line),
            shaded: false,
        });
        for child in &item.children {
            layout_list(child, indent + INDENT_STEP, font, out);
        }
    }
}

fn spans(runs: &[Run]) -> Vec<Span> {
    merge(
        runs.iter()
            .map(|run| Span {
                text: run.text.replace('\t', TAB),
                style: run.style,
            })
            .collect(),
    )
}

/// Joins neighbours with equal styles and drops empty spans.
fn merge(spans: Vec<Span>) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans.into_iter().filter(|span| !span.text.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.style == span.style => last.text.push_str(&span.text),
            _ => merged.push(span),
        }
    }
    merged
}

/// A piece of text placed on a wrapped line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub line: usize,
    pub x: i32,
    pub width: i32,
    pub text: String,
    pub style: RunStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    pub fragments: Vec<Fragment>,
    pub lines: usize,
}

/// Word-wraps styled spans into `max_width`. `measure` returns the advance
/// width of a piece of text in the given style. Newlines force a break; a
/// word wider than the line is placed on its own line and allowed to
/// overflow.
pub fn flow<F>(spans: &[Span], max_width: i32, mut measure: F) -> Flow
where
    F: FnMut(&str, RunStyle) -> i32,
{
    let mut fragments: Vec<Fragment> = Vec::new();
    let mut line = 0;
    let mut x = 0;

    for span in spans {
        for piece in split_words(&span.text) {
            if piece == "\n" {
                line += 1;
                x = 0;
                continue;
            }

            let width = measure(piece, span.style);
            let visible = measure(piece.trim_end_matches(' '), span.style);
            if x > 0 && x + visible > max_width {
                line += 1;
                x = 0;
            }

            match fragments.last_mut() {
                Some(last) if last.line == line && last.style == span.style && last.x + last.width == x => {
                    last.text.push_str(piece);
                    last.width += width;
                }
                _ => fragments.push(Fragment {
                    line,
                    x,
                    width,
                    text: piece.to_string(),
                    style: span.style,
                }),
            }
            x += width;
        }
    }

    Flow {
        fragments,
        lines: line + 1,
    }
}

/// Splits into words that keep their trailing spaces, with each newline as
/// its own piece.
fn split_words(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_space = false;

    for (index, ch) in text.char_indices() {
        if ch == '\n' {
            if start < index {
                pieces.push(&text[start..index]);
            }
            pieces.push("\n");
            start = index + 1;
            in_space = false;
            continue;
        }

        let space = ch == ' ';
        if in_space && !space {
            pieces.push(&text[start..index]);
            start = index;
        }
        in_space = space;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Last laid-out preview, rebuilt only when the preview revision moves.
#[derive(Debug, Default)]
pub struct PaintCache {
    revision: Option<u64>,
    items: Vec<PaintItem>,
}

impl PaintCache {
    /// `None` means the preview cannot be read right now (a nested dialog
    /// loop holds it); the previous layout is returned unchanged.
    pub fn refresh(&mut self, source: Option<(u64, &PreviewModel)>) -> &[PaintItem] {
        if let Some((revision, model)) = source {
            if self.revision != Some(revision) {
                self.items = layout(model);
                self.revision = Some(revision);
            }
        }
        &self.items
    }
}

/// Wheel scrolling for the preview: `notches` is positive when scrolling up.
pub fn scroll_by(current: i32, notches: i32, step: i32, content: i32, viewport: i32) -> i32 {
    let max = (content - viewport).max(0);
    (current - notches * step).clamp(0, max)
}
