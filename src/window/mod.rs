use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
    mem::size_of,
};

use windows::{
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM},
        Graphics::Gdi::{CreateFontIndirectW, DeleteObject, HFONT, HGDIOBJ, LOGFONTW},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            HiDpi::{
                DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, GetDpiForWindow,
                SetProcessDpiAwarenessContext,
            },
            WindowsAndMessaging::{
                ACCEL, AdjustWindowRectEx, AppendMenuW, CREATESTRUCTW, CS_HREDRAW, CS_VREDRAW,
                CreateAcceleratorTableW, CreateMenu, CreatePopupMenu, CreateWindowExW,
                DefWindowProcW, DestroyAcceleratorTable, DispatchMessageW, DrawMenuBar,
                EnableMenuItem, FCONTROL, FSHIFT, FVIRTKEY, GWLP_USERDATA, GetClientRect,
                GetMessageW, GetSystemMetrics, GetWindowLongPtrW, GetWindowTextLengthW,
                GetWindowTextW, HACCEL, HMENU, IDC_ARROW, LoadCursorW, MB_ICONERROR, MB_OK,
                MF_BYCOMMAND, MF_ENABLED, MF_GRAYED, MF_POPUP, MF_STRING, MSG, MessageBoxW, MoveWindow,
                PostQuitMessage, RegisterClassExW, SM_CXSCREEN, SM_CYSCREEN, SW_SHOW, SendMessageW,
                SetFocus, SetMenu, SetWindowLongPtrW, SetWindowTextW, ShowWindow,
                TranslateAcceleratorW, TranslateMessage, WINDOW_EX_STYLE, WINDOW_STYLE,
                WM_COMMAND, WM_CREATE, WM_DESTROY, WM_MOUSEWHEEL, WM_NCCREATE, WM_NCDESTROY,
                WM_PAINT, WM_SETFOCUS, WM_SETFONT, WM_SIZE, WNDCLASSEXW, WS_CHILD,
                WS_CLIPCHILDREN, WS_EX_CLIENTEDGE, WS_OVERLAPPEDWINDOW, WS_VISIBLE, WS_VSCROLL,
            },
        },
    },
    core::{HSTRING, PCWSTR, w},
};

use crate::{
    editor::line_endings::LineEnding,
    error::{EditorError, Result},
    render::{gdi, layout},
    session::{ActionOutcome, Collaborators, Session, WindowShell},
    settings::schema::Settings,
    ui::{self, MenuCommand},
    window::{
        dialogs::NativeFilePicker,
        panes::{NativeEditor, invalidate, refresh_preview, sync_from_control},
    },
    workspace::Workspace,
};

pub mod dialogs;
pub mod panes;

const EDITOR_ID: u16 = 0x201;
const EN_CHANGE: u16 = 0x0300;
const EM_SETLIMITTEXT: u32 = 0x00C5;
const ES_MULTILINE: u32 = 0x0004;
const ES_AUTOVSCROLL: u32 = 0x0040;
const ES_NOHIDESEL: u32 = 0x0100;
const ES_WANTRETURN: u32 = 0x1000;
const WHEEL_DELTA: i32 = 120;
const SCROLL_STEP: i32 = 48;

pub struct AppWindow {
    hwnd: HWND,
    accelerators: HACCEL,
}

struct WindowState {
    editor: Cell<HWND>,
    preview: Cell<HWND>,
    menu: Cell<HMENU>,
    editor_font: Cell<HFONT>,
    session: RefCell<Session>,
    workspace: RefCell<Workspace>,
    line_ending: Cell<LineEnding>,
    syncing: Cell<bool>,
    preview_scroll: Cell<i32>,
    preview_height: Cell<i32>,
    preview_fonts: RefCell<gdi::FontCache>,
    paint_cache: RefCell<layout::PaintCache>,
    split_ratio: f32,
}

impl AppWindow {
    pub fn new(settings: &Settings) -> Result<Self> {
        unsafe {
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }

        let hmodule = unsafe { GetModuleHandleW(None)? };
        let hinstance = HINSTANCE(hmodule.0);
        let class_name = w!("MarkpadMainWindow");

        register_class(hinstance, class_name, main_window_proc)?;
        register_class(hinstance, w!("MarkpadPreview"), preview_proc)?;

        let mut rect = RECT {
            left: 0,
            top: 0,
            right: settings.window.width.max(200),
            bottom: settings.window.height.max(150),
        };
        unsafe {
            AdjustWindowRectEx(&mut rect, WS_OVERLAPPEDWINDOW, true, WINDOW_EX_STYLE(0))?;
        }

        let width = rect.right - rect.left;
        let height = rect.bottom - rect.top;
        let x = (unsafe { GetSystemMetrics(SM_CXSCREEN) } - width).max(0) / 2;
        let y = (unsafe { GetSystemMetrics(SM_CYSCREEN) } - height).max(0) / 2;

        let state = Box::new(WindowState {
            editor: Cell::new(HWND::default()),
            preview: Cell::new(HWND::default()),
            menu: Cell::new(HMENU::default()),
            editor_font: Cell::new(HFONT::default()),
            session: RefCell::new(Session::new(
                settings.window.base_title.clone(),
                settings.session,
            )),
            workspace: RefCell::new(Workspace::new()),
            line_ending: Cell::new(LineEnding::default()),
            syncing: Cell::new(false),
            preview_scroll: Cell::new(0),
            preview_height: Cell::new(0),
            preview_fonts: RefCell::new(gdi::FontCache::new()),
            paint_cache: RefCell::new(layout::PaintCache::default()),
            split_ratio: settings.window.clamped_split_ratio(),
        });
        let state_ptr = Box::into_raw(state);

        let title = HSTRING::from(settings.window.base_title.as_str());
        let created = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class_name,
                &title,
                WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
                x,
                y,
                width,
                height,
                None,
                None,
                Some(hinstance),
                Some(state_ptr as *const c_void),
            )
        };
        let hwnd = match created {
            Ok(hwnd) => hwnd,
            Err(error) => {
                // WM_NCDESTROY never ran, so the state is still ours.
                drop(unsafe { Box::from_raw(state_ptr) });
                return Err(error.into());
            }
        };

        let accelerators = create_accelerators()?;

        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
        }

        tracing::info!(width, height, "main window created");
        Ok(Self { hwnd, accelerators })
    }

    pub fn run(self) -> Result<()> {
        let mut message = MSG::default();
        while unsafe { GetMessageW(&mut message, None, 0, 0) }.as_bool() {
            let translated = unsafe { TranslateAcceleratorW(self.hwnd, self.accelerators, &message) };
            if translated != 0 {
                continue;
            }
            unsafe {
                let _ = TranslateMessage(&message);
                DispatchMessageW(&message);
            }
        }

        Ok(())
    }
}

impl Drop for AppWindow {
    fn drop(&mut self) {
        let _ = unsafe { DestroyAcceleratorTable(self.accelerators) };
    }
}

type WindowProc = unsafe extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT;

fn register_class(hinstance: HINSTANCE, class_name: PCWSTR, proc: WindowProc) -> Result<()> {
    let wc = WNDCLASSEXW {
        cbSize: size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(proc),
        hInstance: hinstance,
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: class_name,
        ..Default::default()
    };

    if unsafe { RegisterClassExW(&wc) } == 0 {
        return Err(EditorError::Platform("window class registration failed".to_string()));
    }
    Ok(())
}

fn create_accelerators() -> Result<HACCEL> {
    let table: Vec<ACCEL> = MenuCommand::ALL
        .into_iter()
        .map(|command| {
            let accel = command.accelerator();
            let mut flags = FVIRTKEY;
            if accel.ctrl {
                flags |= FCONTROL;
            }
            if accel.shift {
                flags |= FSHIFT;
            }
            ACCEL {
                fVirt: flags,
                key: accel.key,
                cmd: command.id(),
            }
        })
        .collect();

    Ok(unsafe { CreateAcceleratorTableW(&table)? })
}

fn create_menu(hwnd: HWND) -> Result<HMENU> {
    unsafe {
        let file_menu = CreatePopupMenu()?;
        for command in MenuCommand::ALL {
            let label = HSTRING::from(command.label());
            AppendMenuW(file_menu, MF_STRING, usize::from(command.id()), &label)?;
        }

        let bar = CreateMenu()?;
        AppendMenuW(bar, MF_POPUP, file_menu.0 as usize, w!("File"))?;
        SetMenu(hwnd, Some(bar))?;
        Ok(bar)
    }
}

fn create_panes(hwnd: HWND, state: &WindowState, state_ptr: *const WindowState) -> Result<()> {
    let hmodule = unsafe { GetModuleHandleW(None)? };
    let hinstance = HINSTANCE(hmodule.0);

    let edit_style = WS_CHILD
        | WS_VISIBLE
        | WS_VSCROLL
        | WINDOW_STYLE(ES_MULTILINE | ES_AUTOVSCROLL | ES_NOHIDESEL | ES_WANTRETURN);
    let editor = unsafe {
        CreateWindowExW(
            WS_EX_CLIENTEDGE,
            w!("EDIT"),
            w!(""),
            edit_style,
            0,
            0,
            0,
            0,
            Some(hwnd),
            Some(HMENU(usize::from(EDITOR_ID) as *mut c_void)),
            Some(hinstance),
            None,
        )?
    };
    unsafe {
        // Lift the 32K default cap on multi-line edit controls.
        let _ = SendMessageW(editor, EM_SETLIMITTEXT, Some(WPARAM(0)), None);
    }

    let font = editor_font(unsafe { GetDpiForWindow(hwnd) });
    if !font.is_invalid() {
        unsafe {
            let _ = SendMessageW(editor, WM_SETFONT, Some(WPARAM(font.0 as usize)), Some(LPARAM(1)));
        }
    }

    let preview = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            w!("MarkpadPreview"),
            w!(""),
            WS_CHILD | WS_VISIBLE,
            0,
            0,
            0,
            0,
            Some(hwnd),
            None,
            Some(hinstance),
            Some(state_ptr as *const c_void),
        )?
    };

    state.editor.set(editor);
    state.preview.set(preview);
    state.editor_font.set(font);
    Ok(())
}

fn editor_font(dpi: u32) -> HFONT {
    let mut logfont = LOGFONTW {
        lfHeight: -((15 * dpi.max(96) as i32 + 48) / 96),
        lfWeight: 400,
        ..Default::default()
    };
    for (slot, unit) in logfont.lfFaceName.iter_mut().zip("Consolas".encode_utf16()) {
        *slot = unit;
    }
    unsafe { CreateFontIndirectW(&logfont) }
}

fn relayout(state: &WindowState, width: i32, height: i32) {
    let (left, right) = ui::split_panes(width, height, state.split_ratio);
    unsafe {
        let _ = MoveWindow(state.editor.get(), left.0, left.1, left.2, left.3, true);
        let _ = MoveWindow(state.preview.get(), right.0, right.1, right.2, right.3, true);
    }
}

/// Runs one File menu command against the session.
fn dispatch(hwnd: HWND, state: &WindowState, command: MenuCommand) {
    // A modal dialog already owns the session.
    let Ok(mut session) = state.session.try_borrow_mut() else {
        return;
    };

    let mut editor = NativeEditor {
        control: state.editor.get(),
        preview: state.preview.get(),
        workspace: &state.workspace,
        line_ending: &state.line_ending,
        syncing: &state.syncing,
        preview_scroll: &state.preview_scroll,
    };
    let mut picker = NativeFilePicker::new(hwnd);
    let mut shell = Win32Shell {
        hwnd,
        menu: state.menu.get(),
    };
    let mut cx = Collaborators {
        editor: &mut editor,
        picker: &mut picker,
        shell: &mut shell,
    };

    let outcome = match command {
        MenuCommand::Open => session.open_document(&mut cx),
        MenuCommand::Save => session.save_document(&mut cx),
        MenuCommand::SaveAs => session.save_as_document(&mut cx),
    };
    tracing::debug!(?command, ?outcome, "menu command handled");

    if matches!(outcome, ActionOutcome::Completed(_)) {
        unsafe {
            let _ = SetFocus(Some(state.editor.get()));
        }
    }
}

struct Win32Shell {
    hwnd: HWND,
    menu: HMENU,
}

impl WindowShell for Win32Shell {
    fn title(&self) -> String {
        let len = unsafe { GetWindowTextLengthW(self.hwnd) }.max(0) as usize;
        let mut buffer = vec![0u16; len + 1];
        let copied = unsafe { GetWindowTextW(self.hwnd, &mut buffer) }.max(0) as usize;
        String::from_utf16_lossy(&buffer[..copied.min(len)])
    }

    fn set_title(&mut self, title: &str) {
        if let Err(error) = unsafe { SetWindowTextW(self.hwnd, &HSTRING::from(title)) } {
            tracing::warn!(%error, "could not set window title");
        }
    }

    fn set_save_enabled(&mut self, enabled: bool) {
        let flag = if enabled { MF_ENABLED } else { MF_GRAYED };
        unsafe {
            let _ = EnableMenuItem(self.menu, u32::from(MenuCommand::Save.id()), MF_BYCOMMAND | flag);
            let _ = DrawMenuBar(self.hwnd);
        }
    }

    fn show_error(&mut self, error: &EditorError) {
        let text = HSTRING::from(error.to_string());
        let caption = HSTRING::from(error.caption());
        unsafe {
            let _ = MessageBoxW(Some(self.hwnd), &text, &caption, MB_OK | MB_ICONERROR);
        }
    }
}

unsafe fn state_from_hwnd(hwnd: HWND) -> Option<&'static WindowState> {
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const WindowState;
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { &*ptr })
    }
}

unsafe fn store_create_param(hwnd: HWND, lparam: LPARAM) {
    let create_struct = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
    unsafe {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, create_struct.lpCreateParams as isize);
    }
}

fn low_word(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

fn high_word(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

unsafe extern "system" fn main_window_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match message {
        WM_NCCREATE => {
            unsafe { store_create_param(hwnd, lparam) };
            unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
        }
        WM_CREATE => {
            let Some(state) = (unsafe { state_from_hwnd(hwnd) }) else {
                return LRESULT(-1);
            };

            let built = create_panes(hwnd, state, state as *const WindowState)
                .and_then(|()| create_menu(hwnd));
            match built {
                Ok(menu) => {
                    state.menu.set(menu);
                    let mut shell = Win32Shell { hwnd, menu };
                    state.session.borrow().attach(&mut shell);

                    let mut client = RECT::default();
                    let _ = unsafe { GetClientRect(hwnd, &mut client) };
                    relayout(state, client.right - client.left, client.bottom - client.top);
                    LRESULT(0)
                }
                Err(error) => {
                    tracing::error!(%error, "window setup failed");
                    LRESULT(-1)
                }
            }
        }
        WM_SIZE => {
            if let Some(state) = unsafe { state_from_hwnd(hwnd) } {
                let width = i32::from(low_word(lparam.0 as usize));
                let height = i32::from(high_word(lparam.0 as usize));
                relayout(state, width, height);
            }
            LRESULT(0)
        }
        WM_SETFOCUS => {
            if let Some(state) = unsafe { state_from_hwnd(hwnd) } {
                unsafe {
                    let _ = SetFocus(Some(state.editor.get()));
                }
            }
            LRESULT(0)
        }
        WM_COMMAND => {
            let Some(state) = (unsafe { state_from_hwnd(hwnd) }) else {
                return unsafe { DefWindowProcW(hwnd, message, wparam, lparam) };
            };

            let id = low_word(wparam.0);
            let code = high_word(wparam.0);
            if id == EDITOR_ID {
                if code == EN_CHANGE
                    && !state.syncing.get()
                    && sync_from_control(state.editor.get(), &state.workspace, state.line_ending.get())
                {
                    refresh_preview(state.preview.get(), &state.workspace);
                }
                return LRESULT(0);
            }

            match MenuCommand::from_id(id) {
                Some(command) => {
                    dispatch(hwnd, state, command);
                    LRESULT(0)
                }
                None => unsafe { DefWindowProcW(hwnd, message, wparam, lparam) },
            }
        }
        WM_DESTROY => {
            if let Some(state) = unsafe { state_from_hwnd(hwnd) } {
                let font = state.editor_font.replace(HFONT::default());
                if !font.is_invalid() {
                    let _ = unsafe { DeleteObject(HGDIOBJ::from(font)) };
                }
            }
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        WM_NCDESTROY => {
            let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut WindowState;
            if !ptr.is_null() {
                unsafe {
                    SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                    drop(Box::from_raw(ptr));
                }
            }
            unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
        }
        _ => unsafe { DefWindowProcW(hwnd, message, wparam, lparam) },
    }
}

unsafe extern "system" fn preview_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match message {
        WM_NCCREATE => {
            unsafe { store_create_param(hwnd, lparam) };
            unsafe { DefWindowProcW(hwnd, message, wparam, lparam) }
        }
        WM_PAINT => {
            let Some(state) = (unsafe { state_from_hwnd(hwnd) }) else {
                return unsafe { DefWindowProcW(hwnd, message, wparam, lparam) };
            };
            let (Ok(mut cache), Ok(mut fonts)) =
                (state.paint_cache.try_borrow_mut(), state.preview_fonts.try_borrow_mut())
            else {
                return unsafe { DefWindowProcW(hwnd, message, wparam, lparam) };
            };

            // During a modal dialog the session may hold the workspace.
            let workspace = state.workspace.try_borrow().ok();
            let pane = workspace.as_ref().map(|workspace| workspace.preview());
            let source = pane.as_ref().map(|pane| (pane.revision(), pane.model()));
            if source.is_none() {
                tracing::trace!("workspace busy, repainting last layout");
            }
            let items = cache.refresh(source);

            let dpi = unsafe { GetDpiForWindow(hwnd) }.max(96);
            let height = gdi::paint_preview(hwnd, items, state.preview_scroll.get(), dpi, &mut fonts);
            state.preview_height.set(height);
            LRESULT(0)
        }
        WM_MOUSEWHEEL => {
            if let Some(state) = unsafe { state_from_hwnd(hwnd) } {
                let delta = i32::from(high_word(wparam.0) as i16);
                let mut client = RECT::default();
                let _ = unsafe { GetClientRect(hwnd, &mut client) };
                let scroll = layout::scroll_by(
                    state.preview_scroll.get(),
                    delta / WHEEL_DELTA,
                    SCROLL_STEP,
                    state.preview_height.get(),
                    client.bottom - client.top,
                );
                if scroll != state.preview_scroll.get() {
                    state.preview_scroll.set(scroll);
                    invalidate(hwnd);
                }
            }
            LRESULT(0)
        }
        WM_NCDESTROY => {
            // The main window owns the state; only forget the pointer.
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                DefWindowProcW(hwnd, message, wparam, lparam)
            }
        }
        _ => unsafe { DefWindowProcW(hwnd, message, wparam, lparam) },
    }
}
