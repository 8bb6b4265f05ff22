use crate::document::{markdown::MarkdownDocument, model::PreviewModel};

pub trait PreviewRenderer {
    /// Replaces everything on display with the rendering of `source`.
    fn render_markdown(&mut self, source: &str);
}

#[derive(Debug, Default)]
pub struct PreviewPane {
    model: PreviewModel,
    revision: u64,
}

impl PreviewPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> &PreviewModel {
        &self.model
    }

    pub fn plain_text(&self) -> String {
        self.model.plain_text()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

impl PreviewRenderer for PreviewPane {
    fn render_markdown(&mut self, source: &str) {
        self.model = MarkdownDocument::new(source).to_preview_model();
        self.revision += 1;
        tracing::trace!(
            revision = self.revision,
            blocks = self.model.content.len(),
            "preview rendered"
        );
    }
}
