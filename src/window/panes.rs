use std::cell::{Cell, RefCell};

use windows::{
    Win32::{
        Foundation::HWND,
        Graphics::Gdi::InvalidateRect,
        UI::WindowsAndMessaging::{GetWindowTextLengthW, GetWindowTextW, SetWindowTextW},
    },
    core::HSTRING,
};

use crate::{
    editor::{
        EditorSurface,
        line_endings::{LineEnding, from_control_text, to_control_text},
    },
    workspace::Workspace,
};

/// Editor surface backed by the multi-line EDIT control. The workspace
/// buffer stays the source of truth; the control is kept in step with it.
pub struct NativeEditor<'a> {
    pub control: HWND,
    pub preview: HWND,
    pub workspace: &'a RefCell<Workspace>,
    pub line_ending: &'a Cell<LineEnding>,
    pub syncing: &'a Cell<bool>,
    pub preview_scroll: &'a Cell<i32>,
}

impl EditorSurface for NativeEditor<'_> {
    fn set_text(&mut self, text: &str) {
        self.line_ending.set(LineEnding::detect(text));
        {
            let mut workspace = self.workspace.borrow_mut();
            workspace.set_text(text);
            tracing::debug!(
                chars = workspace.editor().len_chars(),
                lines = workspace.editor().len_lines(),
                "editor text replaced"
            );
        }

        // The control echoes EN_CHANGE synchronously; `syncing` mutes it.
        self.syncing.set(true);
        let control_text = HSTRING::from(&*to_control_text(text));
        let result = unsafe { SetWindowTextW(self.control, &control_text) };
        self.syncing.set(false);
        if let Err(error) = result {
            tracing::warn!(%error, "edit control rejected text");
        }

        self.preview_scroll.set(0);
        refresh_preview(self.preview, self.workspace);
    }

    fn text(&self) -> String {
        self.workspace.borrow().text()
    }
}

/// Pulls typed text out of the control after EN_CHANGE. Returns whether the
/// buffer changed.
pub fn sync_from_control(
    control: HWND,
    workspace: &RefCell<Workspace>,
    line_ending: LineEnding,
) -> bool {
    let raw = read_control_text(control);
    let text = from_control_text(&raw, line_ending);
    workspace.borrow_mut().editor_mut().replace_from_control(&text)
}

pub fn read_control_text(control: HWND) -> String {
    let len = unsafe { GetWindowTextLengthW(control) }.max(0) as usize;
    let mut buffer = vec![0u16; len + 1];
    let copied = unsafe { GetWindowTextW(control, &mut buffer) }.max(0) as usize;
    String::from_utf16_lossy(&buffer[..copied.min(len)])
}

/// Mirrors the rendered text into the preview window's own text so screen
/// readers can reach it, then schedules a repaint.
pub fn refresh_preview(preview: HWND, workspace: &RefCell<Workspace>) {
    let text = HSTRING::from(workspace.borrow().preview().plain_text());
    let _ = unsafe { SetWindowTextW(preview, &text) };
    invalidate(preview);
}

pub fn invalidate(hwnd: HWND) {
    let _ = unsafe { InvalidateRect(Some(hwnd), None, true) };
}
