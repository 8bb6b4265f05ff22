use std::borrow::Cow;

/// Line terminator a document was loaded with. Native edit controls only
/// understand CRLF, so text is converted on the way in and back on the way
/// out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(index) if text[..index].ends_with('\r') => Self::CrLf,
            _ => Self::Lf,
        }
    }
}

pub fn to_control_text(text: &str) -> Cow<'_, str> {
    if !text.contains('\n') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + text.len() / 16);
    let mut previous = '\0';
    for ch in text.chars() {
        if ch == '\n' && previous != '\r' {
            out.push('\r');
        }
        out.push(ch);
        previous = ch;
    }
    Cow::Owned(out)
}

pub fn from_control_text(text: &str, ending: LineEnding) -> Cow<'_, str> {
    match ending {
        LineEnding::CrLf => Cow::Borrowed(text),
        LineEnding::Lf if text.contains("\r\n") => Cow::Owned(text.replace("\r\n", "\n")),
        LineEnding::Lf => Cow::Borrowed(text),
    }
}
