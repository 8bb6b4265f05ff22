#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
// Outside of tests these are only reached from the Win32 window.
#[cfg_attr(not(windows), allow(dead_code))]
mod document;
#[cfg_attr(not(windows), allow(dead_code))]
mod editor;
mod error;
mod logging;
#[cfg_attr(not(windows), allow(dead_code))]
mod render;
#[cfg_attr(not(windows), allow(dead_code))]
mod session;
mod settings;
#[cfg_attr(not(windows), allow(dead_code))]
mod ui;
#[cfg(windows)]
mod window;
#[cfg_attr(not(windows), allow(dead_code))]
mod workspace;

fn main() -> error::Result<()> {
    app::App::new()?.run()
}
