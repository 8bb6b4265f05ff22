/// Rich-text model displayed by the preview pane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewModel {
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Heading(Heading),
    List(List),
    BlockQuote(BlockQuote),
    CodeBlock(CodeBlock),
    HorizontalRule,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    pub text: String,
    pub style: RunStyle,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub monospace: bool,
    pub link: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct List {
    pub items: Vec<ListItem>,
    pub list_type: ListType,
    pub start_number: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub runs: Vec<Run>,
    pub checked: Option<bool>,
    pub children: Vec<List>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListType {
    #[default]
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockQuote {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CodeBlock {
    pub code: String,
}

impl PreviewModel {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Text content with markup removed, one block per line.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        for block in &self.content {
            block_lines(block, &mut lines);
        }
        lines.join("\n")
    }
}

pub fn runs_text(runs: &[Run]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

fn block_lines(block: &Block, lines: &mut Vec<String>) {
    match block {
        Block::Paragraph(p) => lines.push(runs_text(&p.runs)),
        Block::Heading(h) => lines.push(runs_text(&h.runs)),
        Block::CodeBlock(c) => lines.push(c.code.trim_end_matches('\n').to_string()),
        Block::List(list) => list_lines(list, lines),
        Block::BlockQuote(q) => {
            for nested in &q.blocks {
                block_lines(nested, lines);
            }
        }
        Block::HorizontalRule => {}
    }
}

fn list_lines(list: &List, lines: &mut Vec<String>) {
    for item in &list.items {
        lines.push(runs_text(&item.runs));
        for child in &item.children {
            list_lines(child, lines);
        }
    }
}
