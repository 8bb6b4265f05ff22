use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use crate::{
    editor::{EditorBuffer, EditorSurface},
    render::preview::{PreviewPane, PreviewRenderer},
};

/// The editor buffer and the preview pane bound to it. Every change to the
/// buffer re-renders the preview from the full text.
pub struct Workspace {
    editor: EditorBuffer,
    preview: Rc<RefCell<PreviewPane>>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        let preview = Rc::new(RefCell::new(PreviewPane::new()));
        let mut editor = EditorBuffer::new();

        let target = Rc::clone(&preview);
        editor.on_change(move |text| target.borrow_mut().render_markdown(text));

        Self { editor, preview }
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorBuffer {
        &mut self.editor
    }

    pub fn preview(&self) -> Ref<'_, PreviewPane> {
        self.preview.borrow()
    }
}

impl EditorSurface for Workspace {
    fn set_text(&mut self, text: &str) {
        self.editor.set_text(text);
    }

    fn text(&self) -> String {
        self.editor.text()
    }
}
