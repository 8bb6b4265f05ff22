/// Entries of the File menu, with their command ids and accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Open,
    Save,
    SaveAs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    /// Virtual-key code, which for letters is the uppercase ASCII value.
    pub key: u16,
    pub ctrl: bool,
    pub shift: bool,
}

impl MenuCommand {
    pub const ALL: [Self; 3] = [Self::Open, Self::Save, Self::SaveAs];

    pub const fn id(self) -> u16 {
        match self {
            Self::Open => 0x101,
            Self::Save => 0x102,
            Self::SaveAs => 0x103,
        }
    }

    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open...\tCtrl+O",
            Self::Save => "Save\tCtrl+S",
            Self::SaveAs => "Save as...\tCtrl+Shift+S",
        }
    }

    pub const fn accelerator(self) -> Accelerator {
        match self {
            Self::Open => Accelerator {
                key: b'O' as u16,
                ctrl: true,
                shift: false,
            },
            Self::Save => Accelerator {
                key: b'S' as u16,
                ctrl: true,
                shift: false,
            },
            Self::SaveAs => Accelerator {
                key: b'S' as u16,
                ctrl: true,
                shift: true,
            },
        }
    }
}

/// Splits a window into editor and preview rectangles, left to right.
pub fn split_panes(width: i32, height: i32, ratio: f32) -> ((i32, i32, i32, i32), (i32, i32, i32, i32)) {
    const DIVIDER: i32 = 4;

    let width = width.max(0);
    let height = height.max(0);
    let left = ((width as f32) * ratio).round() as i32;
    let left = left.clamp(0, (width - DIVIDER).max(0));
    let right_x = (left + DIVIDER).min(width);

    ((0, 0, left, height), (right_x, 0, width - right_x, height))
}
