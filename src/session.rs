//! Document session: which file the editor is bound to, whether Save is
//! available, and how Open / Save / Save as move between those states.
//!
//! The session owns no text. It reaches the editor, the file pickers and
//! the window through [`Collaborators`], which the caller assembles for the
//! duration of one handler call.

use crate::{
    document::{self, DocumentLocation, FilePicker, Picked},
    editor::EditorSurface,
    error::EditorError,
    settings::schema::{SavePolicy, SessionSettings, TitleMode},
};

/// Menu bar and title bar of the hosting window.
pub trait WindowShell {
    fn title(&self) -> String;
    fn set_title(&mut self, title: &str);
    fn set_save_enabled(&mut self, enabled: bool);
    /// Modal notification. Returns once the user has dismissed it.
    fn show_error(&mut self, error: &EditorError);
}

pub struct Collaborators<'a> {
    pub editor: &'a mut dyn EditorSurface,
    pub picker: &'a mut dyn FilePicker,
    pub shell: &'a mut dyn WindowShell,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(DocumentLocation),
    Cancelled,
    /// The error was already shown to the user.
    Failed,
    /// Save was requested while disabled, or is configured inert.
    Unavailable,
}

#[derive(Debug)]
pub struct Session {
    current_file: Option<DocumentLocation>,
    base_title: String,
    settings: SessionSettings,
}

impl Session {
    pub fn new(base_title: impl Into<String>, settings: SessionSettings) -> Self {
        Self {
            current_file: None,
            base_title: base_title.into(),
            settings,
        }
    }

    pub fn current_file(&self) -> Option<&DocumentLocation> {
        self.current_file.as_ref()
    }

    pub fn save_enabled(&self) -> bool {
        self.current_file.is_some()
    }

    /// Pushes the initial title and Save state to a freshly built shell.
    pub fn attach(&self, shell: &mut dyn WindowShell) {
        shell.set_title(&self.base_title);
        shell.set_save_enabled(self.save_enabled());
    }

    pub fn open_document(&mut self, cx: &mut Collaborators<'_>) -> ActionOutcome {
        let handle = match cx.picker.pick_open() {
            Ok(Picked::Selected(handle)) => handle,
            Ok(Picked::Cancelled) => {
                tracing::debug!("open cancelled");
                return ActionOutcome::Cancelled;
            }
            Err(error) => return report(cx.shell, "open", error),
        };

        let (location, text) = match document::read_document(handle) {
            Ok(read) => read,
            Err(error) => return report(cx.shell, "open", error),
        };

        cx.editor.set_text(&text);
        self.bind(location, cx.shell)
    }

    pub fn save_as_document(&mut self, cx: &mut Collaborators<'_>) -> ActionOutcome {
        let suggested = self
            .current_file
            .as_ref()
            .map(|location| location.name().to_string())
            .unwrap_or_default();

        let handle = match cx.picker.pick_save(&suggested) {
            Ok(Picked::Selected(handle)) => handle,
            Ok(Picked::Cancelled) => {
                tracing::debug!("save as cancelled");
                return ActionOutcome::Cancelled;
            }
            Err(error) => return report(cx.shell, "save as", error),
        };

        let text = cx.editor.text();
        match document::write_document(handle, &text) {
            Ok(location) => self.bind(location, cx.shell),
            Err(error) => report(cx.shell, "save as", error),
        }
    }

    pub fn save_document(&mut self, cx: &mut Collaborators<'_>) -> ActionOutcome {
        let Some(location) = self.current_file.clone() else {
            return ActionOutcome::Unavailable;
        };

        if self.settings.save_policy == SavePolicy::Inert {
            tracing::debug!(path = %location, "save is inert");
            return ActionOutcome::Unavailable;
        }

        let text = cx.editor.text();
        let written = cx
            .picker
            .reopen_for_write(&location)
            .and_then(|handle| document::write_document(handle, &text));

        match written {
            Ok(location) => {
                tracing::info!(path = %location, "document saved");
                ActionOutcome::Completed(location)
            }
            Err(error) => report(cx.shell, "save", error),
        }
    }

    fn bind(&mut self, location: DocumentLocation, shell: &mut dyn WindowShell) -> ActionOutcome {
        let title = match self.settings.title_mode {
            TitleMode::Replace => format!("{} {}", self.base_title, location.name()),
            TitleMode::Append => format!("{} {}", shell.title(), location.name()),
        };
        shell.set_title(&title);

        tracing::info!(path = %location, "document bound");
        self.current_file = Some(location.clone());
        shell.set_save_enabled(true);
        ActionOutcome::Completed(location)
    }
}

fn report(shell: &mut dyn WindowShell, action: &str, error: EditorError) -> ActionOutcome {
    tracing::warn!(action, %error, "file action failed");
    shell.show_error(&error);
    ActionOutcome::Failed
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        collections::VecDeque,
        io::{self, Cursor, Read, Write},
        rc::Rc,
    };

    use super::*;
    use crate::{
        document::{ReadHandle, WriteHandle},
        workspace::Workspace,
    };

    const BASE: &str = "Markdown";

    #[derive(Default)]
    struct FakeShell {
        title: String,
        save_enabled: bool,
        errors: Vec<String>,
    }

    impl WindowShell for FakeShell {
        fn title(&self) -> String {
            self.title.clone()
        }

        fn set_title(&mut self, title: &str) {
            self.title = title.to_string();
        }

        fn set_save_enabled(&mut self, enabled: bool) {
            self.save_enabled = enabled;
        }

        fn show_error(&mut self, error: &EditorError) {
            self.errors.push(error.to_string());
        }
    }

    struct MemReader {
        location: DocumentLocation,
        data: Cursor<Vec<u8>>,
        fail: bool,
        released: Rc<RefCell<u32>>,
    }

    impl Read for MemReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
            }
            self.data.read(buf)
        }
    }

    impl ReadHandle for MemReader {
        fn location(&self) -> &DocumentLocation {
            &self.location
        }
    }

    impl Drop for MemReader {
        fn drop(&mut self) {
            *self.released.borrow_mut() += 1;
        }
    }

    /// Bytes reach `disk` only on commit, like the staged file handle.
    struct MemWriter {
        location: DocumentLocation,
        staged: Vec<u8>,
        disk: Rc<RefCell<Vec<u8>>>,
        fail: bool,
        released: Rc<RefCell<u32>>,
    }

    impl Write for MemWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.staged.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl WriteHandle for MemWriter {
        fn location(&self) -> &DocumentLocation {
            &self.location
        }

        fn commit(mut self: Box<Self>) -> io::Result<()> {
            *self.disk.borrow_mut() = std::mem::take(&mut self.staged);
            Ok(())
        }
    }

    impl Drop for MemWriter {
        fn drop(&mut self) {
            *self.released.borrow_mut() += 1;
        }
    }

    enum Script {
        Select { name: &'static str, content: &'static [u8], fail_io: bool },
        Cancel,
        Fail,
    }

    enum Reopen {
        Fail,
        FailWrite,
    }

    #[derive(Default)]
    struct FakePicker {
        script: VecDeque<Script>,
        reopen_script: VecDeque<Reopen>,
        written: Rc<RefCell<Vec<u8>>>,
        released: Rc<RefCell<u32>>,
        suggestions: Vec<String>,
        reopened: Vec<DocumentLocation>,
    }

    impl FakePicker {
        fn then(mut self, step: Script) -> Self {
            self.script.push_back(step);
            self
        }

        fn select(self, name: &'static str, content: &'static [u8]) -> Self {
            self.then(Script::Select {
                name,
                content,
                fail_io: false,
            })
        }

        fn then_reopen(mut self, step: Reopen) -> Self {
            self.reopen_script.push_back(step);
            self
        }

        fn writer(&self, location: DocumentLocation, fail: bool) -> Box<MemWriter> {
            Box::new(MemWriter {
                location,
                staged: Vec::new(),
                disk: Rc::clone(&self.written),
                fail,
                released: Rc::clone(&self.released),
            })
        }

        fn next(&mut self) -> Script {
            self.script.pop_front().expect("unexpected picker call")
        }
    }

    impl FilePicker for FakePicker {
        fn pick_open(&mut self) -> crate::error::Result<Picked<Box<dyn ReadHandle>>> {
            match self.next() {
                Script::Select {
                    name,
                    content,
                    fail_io,
                } => Ok(Picked::Selected(Box::new(MemReader {
                    location: DocumentLocation::new(name),
                    data: Cursor::new(content.to_vec()),
                    fail: fail_io,
                    released: Rc::clone(&self.released),
                }))),
                Script::Cancel => Ok(Picked::Cancelled),
                Script::Fail => Err(EditorError::Dialog { code: 0xFFFF }),
            }
        }

        fn pick_save(
            &mut self,
            suggested_name: &str,
        ) -> crate::error::Result<Picked<Box<dyn WriteHandle>>> {
            self.suggestions.push(suggested_name.to_string());
            match self.next() {
                Script::Select { name, fail_io, .. } => {
                    Ok(Picked::Selected(self.writer(DocumentLocation::new(name), fail_io)))
                }
                Script::Cancel => Ok(Picked::Cancelled),
                Script::Fail => Err(EditorError::Dialog { code: 0xFFFF }),
            }
        }

        fn reopen_for_write(
            &mut self,
            location: &DocumentLocation,
        ) -> crate::error::Result<Box<dyn WriteHandle>> {
            self.reopened.push(location.clone());
            match self.reopen_script.pop_front() {
                None => Ok(self.writer(location.clone(), false)),
                Some(Reopen::FailWrite) => Ok(self.writer(location.clone(), true)),
                Some(Reopen::Fail) => Err(EditorError::write(
                    location.path(),
                    io::Error::new(io::ErrorKind::PermissionDenied, "locked"),
                )),
            }
        }
    }

    struct Harness {
        session: Session,
        workspace: Workspace,
        picker: FakePicker,
        shell: FakeShell,
    }

    impl Harness {
        fn new(picker: FakePicker) -> Self {
            Self::with_settings(picker, SessionSettings::default())
        }

        fn with_settings(picker: FakePicker, settings: SessionSettings) -> Self {
            let session = Session::new(BASE, settings);
            let mut shell = FakeShell::default();
            session.attach(&mut shell);
            Self {
                session,
                workspace: Workspace::new(),
                picker,
                shell,
            }
        }

        fn run(&mut self, action: fn(&mut Session, &mut Collaborators<'_>) -> ActionOutcome) -> ActionOutcome {
            let mut cx = Collaborators {
                editor: &mut self.workspace,
                picker: &mut self.picker,
                shell: &mut self.shell,
            };
            action(&mut self.session, &mut cx)
        }

        fn snapshot(&self) -> (Option<DocumentLocation>, bool, String, String, bool) {
            (
                self.session.current_file().cloned(),
                self.session.save_enabled(),
                self.shell.title.clone(),
                self.workspace.text(),
                self.shell.save_enabled,
            )
        }
    }

    #[test]
    fn starts_unbound_with_save_disabled() {
        let harness = Harness::new(FakePicker::default());
        assert!(harness.session.current_file().is_none());
        assert!(!harness.session.save_enabled());
        assert!(!harness.shell.save_enabled);
        assert_eq!(harness.shell.title, BASE);
    }

    #[test]
    fn open_loads_text_renders_preview_and_enables_save() {
        let mut harness = Harness::new(FakePicker::default().select("hello.md", b"Hello"));

        let outcome = harness.run(Session::open_document);

        assert_eq!(outcome, ActionOutcome::Completed(DocumentLocation::new("hello.md")));
        assert_eq!(harness.workspace.text(), "Hello");
        assert_eq!(harness.workspace.preview().plain_text(), "Hello");
        assert!(harness.session.save_enabled());
        assert!(harness.shell.save_enabled);
        assert_eq!(harness.session.current_file().unwrap().name(), "hello.md");
        assert_eq!(harness.shell.title, "Markdown hello.md");
        assert_eq!(*harness.picker.released.borrow(), 1);
    }

    #[test]
    fn cancelled_open_changes_nothing() {
        let mut harness = Harness::new(FakePicker::default().select("a.md", b"A").then(Script::Cancel));
        harness.run(Session::open_document);
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::open_document), ActionOutcome::Cancelled);
        assert_eq!(harness.snapshot(), before);
        assert!(harness.shell.errors.is_empty());
    }

    #[test]
    fn failed_open_dialog_reports_and_keeps_state() {
        let mut harness = Harness::new(FakePicker::default().then(Script::Fail));
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::open_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert_eq!(harness.shell.errors.len(), 1);
    }

    #[test]
    fn read_failure_does_not_swap_document_and_releases_handle() {
        let mut harness = Harness::new(FakePicker::default().select("a.md", b"kept").then(Script::Select {
            name: "broken.md",
            content: b"never",
            fail_io: true,
        }));
        harness.run(Session::open_document);
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::open_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert_eq!(harness.workspace.text(), "kept");
        assert_eq!(harness.shell.errors.len(), 1);
        assert!(harness.shell.errors[0].contains("broken.md"));
        assert_eq!(*harness.picker.released.borrow(), 2);
    }

    #[test]
    fn save_as_writes_exact_utf8_bytes_and_binds() {
        let mut harness = Harness::new(FakePicker::default().select("out.md", b""));
        let text = "# Título\r\n\n- ünïcode ✓\n";
        harness.workspace.set_text(text);

        let outcome = harness.run(Session::save_as_document);

        assert_eq!(outcome, ActionOutcome::Completed(DocumentLocation::new("out.md")));
        assert_eq!(*harness.picker.written.borrow(), text.as_bytes());
        assert!(harness.session.save_enabled());
        assert_eq!(harness.shell.title, "Markdown out.md");
        assert_eq!(harness.picker.suggestions, vec![String::new()]);
        assert_eq!(*harness.picker.released.borrow(), 1);
    }

    #[test]
    fn save_as_suggests_current_name() {
        let mut harness = Harness::new(
            FakePicker::default()
                .select("notes.md", b"x")
                .then(Script::Cancel),
        );
        harness.run(Session::open_document);
        assert_eq!(harness.run(Session::save_as_document), ActionOutcome::Cancelled);
        assert_eq!(harness.picker.suggestions, vec!["notes.md".to_string()]);
        assert_eq!(harness.session.current_file().unwrap().name(), "notes.md");
    }

    #[test]
    fn cancelled_and_failed_save_as_change_nothing() {
        let mut harness = Harness::new(FakePicker::default().then(Script::Cancel).then(Script::Fail));
        harness.workspace.set_text("draft");
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::save_as_document), ActionOutcome::Cancelled);
        assert_eq!(harness.snapshot(), before);
        assert!(harness.shell.errors.is_empty());

        assert_eq!(harness.run(Session::save_as_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert_eq!(harness.shell.errors.len(), 1);
    }

    #[test]
    fn write_failure_is_reported_as_write_error() {
        let mut harness = Harness::new(FakePicker::default().then(Script::Select {
            name: "ro.md",
            content: b"",
            fail_io: true,
        }));
        harness.workspace.set_text("draft");
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::save_as_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert!(harness.shell.errors[0].starts_with("could not write ro.md"));
        assert_eq!(*harness.picker.released.borrow(), 1);
    }

    #[test]
    fn replace_mode_recomputes_title_from_base() {
        let mut harness = Harness::new(FakePicker::default().select("one.md", b"1").select("two.md", b"2"));

        harness.run(Session::open_document);
        assert_eq!(harness.shell.title, "Markdown one.md");
        harness.run(Session::open_document);
        assert_eq!(harness.shell.title, "Markdown two.md");
    }

    #[test]
    fn append_mode_accumulates_names() {
        let settings = SessionSettings {
            title_mode: TitleMode::Append,
            ..SessionSettings::default()
        };
        let mut harness = Harness::with_settings(
            FakePicker::default().select("one.md", b"1").select("two.md", b"2"),
            settings,
        );

        harness.run(Session::open_document);
        assert_eq!(harness.shell.title, "Markdown one.md");
        harness.run(Session::open_document);
        assert_eq!(harness.shell.title, "Markdown one.md two.md");
        assert_eq!(harness.session.current_file().unwrap().name(), "two.md");
        assert!(harness.session.save_enabled());
    }

    #[test]
    fn save_is_unavailable_until_bound() {
        let mut harness = Harness::new(FakePicker::default());
        harness.workspace.set_text("unsaved");
        assert_eq!(harness.run(Session::save_document), ActionOutcome::Unavailable);
        assert!(harness.picker.reopened.is_empty());
        assert!(harness.picker.written.borrow().is_empty());
    }

    #[test]
    fn save_rewrites_bound_file_without_prompting() {
        let mut harness = Harness::new(FakePicker::default().select("doc.md", b"old"));
        harness.run(Session::open_document);
        harness.workspace.set_text("new text");

        let outcome = harness.run(Session::save_document);

        assert_eq!(outcome, ActionOutcome::Completed(DocumentLocation::new("doc.md")));
        assert_eq!(harness.picker.reopened, vec![DocumentLocation::new("doc.md")]);
        assert_eq!(*harness.picker.written.borrow(), b"new text");
        assert_eq!(harness.shell.title, "Markdown doc.md");
        assert!(harness.picker.suggestions.is_empty());
    }

    #[test]
    fn failed_save_keeps_file_and_binding() {
        let mut harness = Harness::new(
            FakePicker::default()
                .select("doc.md", b"old")
                .then(Script::Select {
                    name: "doc.md",
                    content: b"",
                    fail_io: false,
                })
                .then_reopen(Reopen::FailWrite)
                .then_reopen(Reopen::Fail),
        );
        harness.run(Session::open_document);
        harness.workspace.set_text("precious contents");
        assert!(matches!(harness.run(Session::save_as_document), ActionOutcome::Completed(_)));
        harness.workspace.set_text("edited");
        let before = harness.snapshot();

        assert_eq!(harness.run(Session::save_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert_eq!(harness.shell.errors.len(), 1);
        assert!(harness.shell.errors[0].starts_with("could not write doc.md"));
        assert_eq!(*harness.picker.written.borrow(), b"precious contents");

        assert_eq!(harness.run(Session::save_document), ActionOutcome::Failed);
        assert_eq!(harness.snapshot(), before);
        assert_eq!(harness.shell.errors.len(), 2);
        assert_eq!(*harness.picker.written.borrow(), b"precious contents");
        assert!(harness.session.save_enabled());
        assert_eq!(harness.shell.title, "Markdown doc.md");

        assert!(matches!(harness.run(Session::save_document), ActionOutcome::Completed(_)));
        assert_eq!(*harness.picker.written.borrow(), b"edited");
    }

    #[test]
    fn inert_save_writes_nothing() {
        let settings = SessionSettings {
            save_policy: SavePolicy::Inert,
            ..SessionSettings::default()
        };
        let mut harness = Harness::with_settings(FakePicker::default().select("doc.md", b"old"), settings);
        harness.run(Session::open_document);
        harness.workspace.set_text("edited");

        assert_eq!(harness.run(Session::save_document), ActionOutcome::Unavailable);
        assert!(harness.picker.reopened.is_empty());
        assert!(harness.session.save_enabled());
    }

    #[test]
    fn save_to_real_file_uses_default_reopen() {
        struct DiskPicker(std::path::PathBuf);

        impl FilePicker for DiskPicker {
            fn pick_open(&mut self) -> crate::error::Result<Picked<Box<dyn ReadHandle>>> {
                Ok(Picked::Cancelled)
            }

            fn pick_save(&mut self, _: &str) -> crate::error::Result<Picked<Box<dyn WriteHandle>>> {
                let handle = document::FileWriteHandle::create(&self.0)?;
                Ok(Picked::Selected(Box::new(handle)))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.md");
        let mut session = Session::new(BASE, SessionSettings::default());
        let mut workspace = Workspace::new();
        let mut picker = DiskPicker(path.clone());
        let mut shell = FakeShell::default();

        workspace.set_text("first");
        let mut cx = Collaborators {
            editor: &mut workspace,
            picker: &mut picker,
            shell: &mut shell,
        };
        session.save_as_document(&mut cx);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");

        cx.editor.set_text("second, longer");
        session.save_document(&mut cx);
        cx.editor.set_text("2nd");
        session.save_document(&mut cx);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "2nd");
    }
}
