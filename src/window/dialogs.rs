use std::{
    ffi::OsString,
    os::windows::ffi::OsStringExt,
    path::PathBuf,
};

use windows::{
    Win32::{
        Foundation::HWND,
        UI::Controls::Dialogs::{
            CommDlgExtendedError, GetOpenFileNameW, GetSaveFileNameW, OFN_EXPLORER,
            OFN_FILEMUSTEXIST, OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
        },
    },
    core::{PCWSTR, PWSTR, w},
};

use crate::{
    document::{FilePicker, FileReadHandle, FileWriteHandle, Picked, ReadHandle, WriteHandle},
    error::{EditorError, Result},
};

const PATH_BUFFER_LEN: usize = 1024;

/// Common-dialog open/save pickers owned by the main window.
pub struct NativeFilePicker {
    owner: HWND,
}

impl NativeFilePicker {
    pub fn new(owner: HWND) -> Self {
        Self { owner }
    }
}

impl FilePicker for NativeFilePicker {
    fn pick_open(&mut self) -> Result<Picked<Box<dyn ReadHandle>>> {
        let Some(path) = pick_open_file(self.owner)? else {
            return Ok(Picked::Cancelled);
        };
        Ok(Picked::Selected(Box::new(FileReadHandle::open(path)?)))
    }

    fn pick_save(&mut self, suggested_name: &str) -> Result<Picked<Box<dyn WriteHandle>>> {
        let Some(path) = pick_save_file(self.owner, suggested_name)? else {
            return Ok(Picked::Cancelled);
        };
        Ok(Picked::Selected(Box::new(FileWriteHandle::create(path)?)))
    }
}

fn markdown_filter() -> Vec<u16> {
    let mut filter = String::new();
    filter.push_str("Markdown (*.md;*.markdown)\0*.md;*.markdown\0");
    filter.push_str("Text Document (*.txt)\0*.txt\0");
    filter.push_str("All Files (*.*)\0*.*\0\0");
    filter.encode_utf16().collect()
}

/// `Ok(None)` when the user dismissed the dialog.
fn pick_open_file(hwnd: HWND) -> Result<Option<PathBuf>> {
    let mut file_buffer = vec![0u16; PATH_BUFFER_LEN];
    let filter_wide = markdown_filter();

    let mut open = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd,
        lpstrFilter: PCWSTR::from_raw(filter_wide.as_ptr()),
        lpstrFile: PWSTR(file_buffer.as_mut_ptr()),
        nMaxFile: file_buffer.len() as u32,
        lpstrTitle: w!("Open"),
        Flags: OFN_EXPLORER | OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST,
        ..Default::default()
    };

    let ok = unsafe { GetOpenFileNameW(&mut open).as_bool() };
    if !ok {
        return dialog_failure();
    }
    Ok(path_from_buffer(&file_buffer))
}

fn pick_save_file(hwnd: HWND, suggested_name: &str) -> Result<Option<PathBuf>> {
    let mut file_buffer = vec![0u16; PATH_BUFFER_LEN];
    let suggested = suggested_name.encode_utf16().collect::<Vec<u16>>();
    let suggested_len = suggested.len().min(file_buffer.len() - 1);
    file_buffer[..suggested_len].copy_from_slice(&suggested[..suggested_len]);

    let filter_wide = markdown_filter();

    let mut save = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd,
        lpstrFilter: PCWSTR::from_raw(filter_wide.as_ptr()),
        lpstrDefExt: w!("md"),
        lpstrFile: PWSTR(file_buffer.as_mut_ptr()),
        nMaxFile: file_buffer.len() as u32,
        lpstrTitle: w!("Save as"),
        Flags: OFN_EXPLORER | OFN_PATHMUSTEXIST | OFN_OVERWRITEPROMPT,
        ..Default::default()
    };

    let ok = unsafe { GetSaveFileNameW(&mut save).as_bool() };
    if !ok {
        return dialog_failure();
    }
    Ok(path_from_buffer(&file_buffer))
}

/// A false return from the common dialogs is a cancel unless an extended
/// error code is set.
fn dialog_failure() -> Result<Option<PathBuf>> {
    let code = unsafe { CommDlgExtendedError() }.0;
    if code == 0 {
        Ok(None)
    } else {
        Err(EditorError::Dialog { code })
    }
}

fn path_from_buffer(buffer: &[u16]) -> Option<PathBuf> {
    let len = buffer.iter().position(|c| *c == 0).unwrap_or(buffer.len());
    if len == 0 {
        return None;
    }
    Some(PathBuf::from(OsString::from_wide(&buffer[..len])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_stops_at_first_nul() {
        let mut buffer: Vec<u16> = "C:\\notes\\a.md".encode_utf16().collect();
        buffer.extend([0, b'x' as u16, 0]);
        assert_eq!(path_from_buffer(&buffer), Some(PathBuf::from("C:\\notes\\a.md")));
        assert_eq!(path_from_buffer(&[0, 0]), None);
    }

    #[test]
    fn filter_is_double_nul_terminated() {
        let filter = markdown_filter();
        assert_eq!(&filter[filter.len() - 2..], &[0, 0]);
    }
}
