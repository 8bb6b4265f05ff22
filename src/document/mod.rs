pub mod encoding;
pub mod markdown;
pub mod model;

use std::{
    fmt,
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::error::{EditorError, Result};

/// Where a document lives on disk, plus the name shown in the title bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    path: PathBuf,
    name: String,
}

impl DocumentLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for DocumentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Outcome of a picker that did not fail.
#[derive(Debug)]
pub enum Picked<T> {
    Selected(T),
    Cancelled,
}

pub trait ReadHandle: Read {
    fn location(&self) -> &DocumentLocation;
}

pub trait WriteHandle: Write {
    fn location(&self) -> &DocumentLocation;

    /// Makes everything written so far the destination's content. A handle
    /// dropped without committing leaves the destination as it was.
    fn commit(self: Box<Self>) -> io::Result<()>;
}

/// Native open/save pickers. Handles are released when dropped.
pub trait FilePicker {
    fn pick_open(&mut self) -> Result<Picked<Box<dyn ReadHandle>>>;

    fn pick_save(&mut self, suggested_name: &str) -> Result<Picked<Box<dyn WriteHandle>>>;

    /// Reopens an already chosen destination for a direct save.
    fn reopen_for_write(&mut self, location: &DocumentLocation) -> Result<Box<dyn WriteHandle>> {
        Ok(Box::new(FileWriteHandle::create(location.path())?))
    }
}

pub struct FileReadHandle {
    location: DocumentLocation,
    file: File,
}

impl FileReadHandle {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let location = DocumentLocation::new(path);
        let file = File::open(location.path())
            .map_err(|source| EditorError::read(location.path(), source))?;
        Ok(Self { location, file })
    }
}

impl Read for FileReadHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl ReadHandle for FileReadHandle {
    fn location(&self) -> &DocumentLocation {
        &self.location
    }
}

/// Writes into a temporary file next to the destination and renames it
/// over the destination on commit.
pub struct FileWriteHandle {
    location: DocumentLocation,
    writer: BufWriter<NamedTempFile>,
}

impl FileWriteHandle {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let location = DocumentLocation::new(path);
        let dir = match location.path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staged = NamedTempFile::new_in(dir)
            .map_err(|source| EditorError::write(location.path(), source))?;
        Ok(Self {
            location,
            writer: BufWriter::new(staged),
        })
    }
}

impl Write for FileWriteHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().as_file().sync_all()
    }
}

impl WriteHandle for FileWriteHandle {
    fn location(&self) -> &DocumentLocation {
        &self.location
    }

    fn commit(self: Box<Self>) -> io::Result<()> {
        let Self { location, writer } = *self;
        let staged = writer.into_inner().map_err(|error| error.into_error())?;
        staged
            .persist(location.path())
            .map(drop)
            .map_err(|error| error.error)
    }
}

/// Reads a handle to completion and decodes it. The handle is consumed and
/// released before returning, on success and on failure.
pub fn read_document(mut handle: Box<dyn ReadHandle>) -> Result<(DocumentLocation, String)> {
    let location = handle.location().clone();
    let mut bytes = Vec::new();
    handle
        .read_to_end(&mut bytes)
        .map_err(|source| EditorError::read(location.path(), source))?;
    drop(handle);

    let decoded = encoding::decode_text(&bytes);
    tracing::debug!(
        path = %location,
        bytes = bytes.len(),
        encoding = decoded.encoding_name,
        "document read"
    );
    Ok((location, decoded.text))
}

/// Writes `text` as UTF-8, flushes and commits. The handle is released
/// before returning; on failure the destination keeps its old content.
pub fn write_document(mut handle: Box<dyn WriteHandle>, text: &str) -> Result<DocumentLocation> {
    let location = handle.location().clone();
    handle
        .write_all(encoding::encode_text(text))
        .and_then(|()| handle.flush())
        .and_then(|()| handle.commit())
        .map_err(|source| EditorError::write(location.path(), source))?;

    tracing::debug!(path = %location, bytes = text.len(), "document written");
    Ok(location)
}
