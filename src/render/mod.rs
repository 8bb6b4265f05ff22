#[cfg(windows)]
pub mod gdi;
pub mod layout;
pub mod preview;
