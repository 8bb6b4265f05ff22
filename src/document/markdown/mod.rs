use pulldown_cmark::{Options, Parser};

use crate::document::model::PreviewModel;

pub mod renderer;

/// A borrowed markdown source ready to be converted for the preview.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownDocument<'a> {
    source: &'a str,
}

impl<'a> MarkdownDocument<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    pub fn parser(&self) -> Parser<'a> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;
        Parser::new_ext(self.source, options)
    }

    pub fn to_preview_model(&self) -> PreviewModel {
        renderer::markdown_to_model(self)
    }
}
