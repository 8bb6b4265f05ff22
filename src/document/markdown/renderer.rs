use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};

use crate::document::{
    markdown::MarkdownDocument,
    model::{
        Block,
        BlockQuote,
        CodeBlock,
        Heading,
        List,
        ListItem,
        ListType,
        Paragraph,
        PreviewModel,
        Run,
        RunStyle,
    },
};

const CELL_SEPARATOR: &str = " | ";

enum Inline {
    Paragraph(Vec<Run>),
    Heading(u8, Vec<Run>),
}

struct ListBuilder {
    list: List,
    item: Option<ListItem>,
}

enum Container {
    Quote(BlockQuote),
    List(ListBuilder),
}

#[derive(Default)]
struct StyleDepth {
    strong: u32,
    emphasis: u32,
    strikethrough: u32,
    link: u32,
}

impl StyleDepth {
    fn current(&self) -> RunStyle {
        RunStyle {
            bold: self.strong > 0,
            italic: self.emphasis > 0,
            strikethrough: self.strikethrough > 0,
            monospace: false,
            link: self.link > 0,
        }
    }
}

#[derive(Default)]
struct ModelBuilder {
    model: PreviewModel,
    containers: Vec<Container>,
    inline: Option<Inline>,
    code: Option<CodeBlock>,
    style: StyleDepth,
}

pub fn markdown_to_model(doc: &MarkdownDocument<'_>) -> PreviewModel {
    let mut builder = ModelBuilder::default();

    for event in doc.parser() {
        builder.handle(event);
    }

    builder.finish()
}

impl ModelBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(code) = self.code.as_mut() {
                    code.code.push_str(&text);
                } else {
                    self.push_run(text.to_string(), self.style.current());
                }
            }
            Event::Code(text) => {
                let style = RunStyle {
                    monospace: true,
                    ..self.style.current()
                };
                self.push_run(text.to_string(), style);
            }
            Event::InlineHtml(html) | Event::Html(html) => {
                self.push_run(html.to_string(), RunStyle::default());
            }
            Event::FootnoteReference(label) => {
                self.push_run(format!("[{label}]"), RunStyle::default());
            }
            Event::SoftBreak | Event::HardBreak => {
                self.push_run("\n".to_string(), self.style.current());
            }
            Event::Rule => self.push_block(Block::HorizontalRule),
            Event::TaskListMarker(checked) => {
                if let Some(item) = self.current_item() {
                    item.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock | Tag::TableHead | Tag::TableRow => {
                self.inline = Some(Inline::Paragraph(Vec::new()));
            }
            Tag::Heading { level, .. } => {
                self.inline = Some(Inline::Heading(heading_level_to_u8(level), Vec::new()));
            }
            Tag::TableCell => {
                if let Some(Inline::Paragraph(runs)) = self.inline.as_mut() {
                    if !runs.is_empty() {
                        runs.push(Run::plain(CELL_SEPARATOR));
                    }
                }
            }
            Tag::BlockQuote(_) => {
                self.containers.push(Container::Quote(BlockQuote::default()));
            }
            Tag::List(start) => {
                self.containers.push(Container::List(ListBuilder {
                    list: List {
                        items: Vec::new(),
                        list_type: if start.is_some() {
                            ListType::Numbered
                        } else {
                            ListType::Bullet
                        },
                        start_number: start.unwrap_or(1),
                    },
                    item: None,
                }));
            }
            Tag::Item => {
                if let Some(Container::List(builder)) = self.containers.last_mut() {
                    builder.item = Some(ListItem::default());
                }
            }
            Tag::CodeBlock(_) => self.code = Some(CodeBlock::default()),
            Tag::Emphasis => self.style.emphasis += 1,
            Tag::Strong => self.style.strong += 1,
            Tag::Strikethrough => self.style.strikethrough += 1,
            Tag::Link { .. } => self.style.link += 1,
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::HtmlBlock | TagEnd::TableHead | TagEnd::TableRow => {
                self.finish_inline();
            }
            TagEnd::Heading(..) => self.finish_inline(),
            TagEnd::BlockQuote(_) => {
                if let Some(Container::Quote(quote)) = self.containers.pop() {
                    self.push_block(Block::BlockQuote(quote));
                }
            }
            TagEnd::List(_) => {
                if let Some(Container::List(mut builder)) = self.containers.pop() {
                    if let Some(item) = builder.item.take() {
                        builder.list.items.push(item);
                    }
                    self.push_block(Block::List(builder.list));
                }
            }
            TagEnd::Item => {
                if let Some(Container::List(builder)) = self.containers.last_mut() {
                    if let Some(item) = builder.item.take() {
                        builder.list.items.push(item);
                    }
                }
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.push_block(Block::CodeBlock(code));
                }
            }
            TagEnd::Emphasis => self.style.emphasis = self.style.emphasis.saturating_sub(1),
            TagEnd::Strong => self.style.strong = self.style.strong.saturating_sub(1),
            TagEnd::Strikethrough => {
                self.style.strikethrough = self.style.strikethrough.saturating_sub(1);
            }
            TagEnd::Link => self.style.link = self.style.link.saturating_sub(1),
            _ => {}
        }
    }

    fn finish(mut self) -> PreviewModel {
        self.finish_inline();
        if let Some(code) = self.code.take() {
            self.push_block(Block::CodeBlock(code));
        }
        while let Some(container) = self.containers.pop() {
            let block = match container {
                Container::Quote(quote) => Block::BlockQuote(quote),
                Container::List(mut builder) => {
                    if let Some(item) = builder.item.take() {
                        builder.list.items.push(item);
                    }
                    Block::List(builder.list)
                }
            };
            self.push_block(block);
        }
        self.model
    }

    fn current_item(&mut self) -> Option<&mut ListItem> {
        match self.containers.last_mut() {
            Some(Container::List(builder)) => builder.item.as_mut(),
            _ => None,
        }
    }

    fn push_run(&mut self, text: String, style: RunStyle) {
        let run = Run { text, style };
        match self.inline.as_mut() {
            Some(Inline::Paragraph(runs)) | Some(Inline::Heading(_, runs)) => runs.push(run),
            // Tight list items carry text without a paragraph.
            None => {
                if let Some(item) = self.current_item() {
                    item.runs.push(run);
                }
            }
        }
    }

    fn finish_inline(&mut self) {
        let Some(inline) = self.inline.take() else {
            return;
        };

        match inline {
            Inline::Paragraph(runs) => {
                if let Some(item) = self.current_item() {
                    if !item.runs.is_empty() {
                        item.runs.push(Run::plain("\n"));
                    }
                    item.runs.extend(runs);
                    return;
                }
                self.push_block(Block::Paragraph(Paragraph { runs }));
            }
            Inline::Heading(level, runs) => {
                self.push_block(Block::Heading(Heading { level, runs }));
            }
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.containers.last_mut() {
            Some(Container::Quote(quote)) => quote.blocks.push(block),
            Some(Container::List(builder)) => {
                let Some(item) = builder.item.as_mut() else {
                    return;
                };
                match block {
                    Block::List(list) => item.children.push(list),
                    other => item.runs.extend(flatten_block(other)),
                }
            }
            None => self.model.content.push(block),
        }
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn flatten_block(block: Block) -> Vec<Run> {
    match block {
        Block::Paragraph(p) => p.runs,
        Block::Heading(h) => h.runs,
        Block::CodeBlock(c) => vec![Run {
            text: c.code,
            style: RunStyle {
                monospace: true,
                ..RunStyle::default()
            },
        }],
        Block::BlockQuote(q) => q.blocks.into_iter().flat_map(flatten_block).collect(),
        Block::List(_) | Block::HorizontalRule => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::runs_text;

    fn render(source: &str) -> PreviewModel {
        MarkdownDocument::new(source).to_preview_model()
    }

    #[test]
    fn plain_text_is_a_single_paragraph() {
        let model = render("Hello");
        assert_eq!(model.content.len(), 1);
        assert!(matches!(&model.content[0], Block::Paragraph(p) if runs_text(&p.runs) == "Hello"));
        assert_eq!(model.plain_text(), "Hello");
    }

    #[test]
    fn empty_source_renders_nothing() {
        assert!(render("").is_empty());
        assert_eq!(render("").plain_text(), "");
    }

    #[test]
    fn headings_keep_their_level() {
        let model = render("# One\n\n### Three");
        let levels: Vec<u8> = model
            .content
            .iter()
            .filter_map(|block| match block {
                Block::Heading(h) => Some(h.level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![1, 3]);
        assert_eq!(model.plain_text(), "One\nThree");
    }

    #[test]
    fn inline_styles_become_run_styles() {
        let model = render("plain **bold** *it* ~~gone~~ `code`");
        let Block::Paragraph(p) = &model.content[0] else {
            panic!("expected paragraph");
        };
        let styled = |text: &str| p.runs.iter().find(|run| run.text == text).map(|run| run.style);
        assert!(styled("bold").unwrap().bold);
        assert!(styled("it").unwrap().italic);
        assert!(styled("gone").unwrap().strikethrough);
        assert!(styled("code").unwrap().monospace);
        assert_eq!(styled("plain "), Some(RunStyle::default()));
    }

    #[test]
    fn lists_nest_and_track_tasks() {
        let model = render("1. first\n2. second\n   - inner\n\n- [x] done\n- [ ] todo\n");
        let lists: Vec<&List> = model
            .content
            .iter()
            .filter_map(|block| match block {
                Block::List(list) => Some(list),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 2);

        let numbered = lists[0];
        assert_eq!(numbered.list_type, ListType::Numbered);
        assert_eq!(numbered.items.len(), 2);
        assert_eq!(runs_text(&numbered.items[0].runs), "first");
        assert_eq!(numbered.items[1].children.len(), 1);
        assert_eq!(runs_text(&numbered.items[1].children[0].items[0].runs), "inner");

        let tasks = lists[1];
        assert_eq!(tasks.list_type, ListType::Bullet);
        assert_eq!(tasks.items[0].checked, Some(true));
        assert_eq!(tasks.items[1].checked, Some(false));
    }

    #[test]
    fn fenced_code_keeps_its_text() {
        let model = render("```rust\nfn main() {}\n```\n");
        let Block::CodeBlock(code) = &model.content[0] else {
            panic!("expected code block");
        };
        assert_eq!(code.code, "fn main() {}\n");
    }

    #[test]
    fn block_quotes_wrap_their_paragraphs() {
        let model = render("> quoted\n\n---\n\nafter");
        assert!(matches!(&model.content[0], Block::BlockQuote(q) if q.blocks.len() == 1));
        assert!(matches!(model.content[1], Block::HorizontalRule));
        assert_eq!(model.plain_text(), "quoted\nafter");
    }

    #[test]
    fn table_rows_render_as_separated_cells() {
        let model = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(model.plain_text(), "a | b\n1 | 2");
    }
}
