pub mod line_endings;

use ropey::Rope;

/// Text entry as seen by the session. Implementations must notify their
/// change listeners after every mutation, including ones made through
/// `set_text`.
pub trait EditorSurface {
    fn set_text(&mut self, text: &str);
    fn text(&self) -> String;
}

pub type ChangeListener = Box<dyn FnMut(&str)>;

/// Rope-backed editor buffer with synchronous change notification.
#[derive(Default)]
pub struct EditorBuffer {
    rope: Rope,
    listeners: Vec<ChangeListener>,
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&str) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Mirrors text typed into a native control. Unchanged text does not
    /// notify, so a programmatic update echoed back by the control renders
    /// once.
    pub fn replace_from_control(&mut self, text: &str) -> bool {
        if self.rope == text {
            return false;
        }
        self.replace(text);
        true
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn replace(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.notify();
    }

    fn notify(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let text = self.rope.to_string();
        for listener in &mut self.listeners {
            listener(&text);
        }
    }
}

impl EditorSurface for EditorBuffer {
    fn set_text(&mut self, text: &str) {
        self.replace(text);
    }

    fn text(&self) -> String {
        self.rope.to_string()
    }
}
