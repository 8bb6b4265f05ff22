use windows::Win32::{
    Foundation::{COLORREF, HWND, RECT, SIZE},
    Graphics::Gdi::{
        BeginPaint, CLEARTYPE_QUALITY, CreateFontIndirectW, CreateSolidBrush, DeleteObject,
        EndPaint, FillRect, GetTextExtentPoint32W, HBRUSH, HDC, HFONT, HGDIOBJ, LOGFONTW,
        PAINTSTRUCT, SelectObject, SetBkMode, SetTextColor, TRANSPARENT, TextOutW,
    },
    UI::WindowsAndMessaging::GetClientRect,
};

use crate::{
    document::model::RunStyle,
    render::layout::{self, FontKind, FontSpec, PaintItem, Span},
};

const BACKGROUND: COLORREF = COLORREF(0x00FF_FFFF);
const TEXT: COLORREF = COLORREF(0x0020_2020);
const LINK: COLORREF = COLORREF(0x00B4_5A00);
const CODE_SHADE: COLORREF = COLORREF(0x00F3_F3F3);
const RULE: COLORREF = COLORREF(0x00C8_C8C8);

const MARGIN: i32 = 12;
const BLOCK_GAP: i32 = 8;

/// Preview fonts, kept across paints and dropped when the DPI changes.
#[derive(Default)]
pub struct FontCache {
    dpi: u32,
    fonts: Vec<(FontSpec, HFONT)>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_dpi(&mut self, dpi: u32) {
        if self.dpi != dpi {
            self.clear();
            self.dpi = dpi;
        }
    }

    fn get(&mut self, spec: FontSpec) -> HFONT {
        if let Some((_, font)) = self.fonts.iter().find(|(cached, _)| *cached == spec) {
            return *font;
        }

        let face = if spec.monospace { "Consolas" } else { "Segoe UI" };
        let mut logfont = LOGFONTW {
            lfHeight: -scale(spec.height, self.dpi),
            lfWeight: if spec.bold { 700 } else { 400 },
            lfItalic: u8::from(spec.italic),
            lfUnderline: u8::from(spec.underline),
            lfStrikeOut: u8::from(spec.strikeout),
            lfQuality: CLEARTYPE_QUALITY,
            ..Default::default()
        };
        for (slot, unit) in logfont.lfFaceName.iter_mut().zip(face.encode_utf16()) {
            *slot = unit;
        }

        let font = unsafe { CreateFontIndirectW(&logfont) };
        self.fonts.push((spec, font));
        font
    }

    fn clear(&mut self) {
        for (_, font) in self.fonts.drain(..) {
            unsafe {
                let _ = DeleteObject(HGDIOBJ::from(font));
            }
        }
    }
}

impl Drop for FontCache {
    fn drop(&mut self) {
        self.clear();
    }
}

fn scale(px: i32, dpi: u32) -> i32 {
    (px * dpi as i32 + 48) / 96
}

fn text_size(hdc: HDC, font: HFONT, text: &str) -> SIZE {
    let wide: Vec<u16> = text.encode_utf16().collect();
    let mut size = SIZE::default();
    unsafe {
        let previous = SelectObject(hdc, HGDIOBJ::from(font));
        let _ = GetTextExtentPoint32W(hdc, &wide, &mut size);
        let _ = SelectObject(hdc, previous);
    }
    size
}

fn line_height(hdc: HDC, fonts: &mut FontCache, kind: FontKind, spans: &[Span]) -> i32 {
    let mut height = text_size(hdc, fonts.get(kind.with_style(RunStyle::default())), "Ag").cy;
    for span in spans {
        height = height.max(text_size(hdc, fonts.get(kind.with_style(span.style)), "Ag").cy);
    }
    height.max(1)
}

/// Paints `items` into the preview window scrolled by `scroll` pixels and
/// returns the full content height.
pub fn paint_preview(
    hwnd: HWND,
    items: &[PaintItem],
    scroll: i32,
    dpi: u32,
    fonts: &mut FontCache,
) -> i32 {
    let mut paint = PAINTSTRUCT::default();
    let hdc = unsafe { BeginPaint(hwnd, &mut paint) };

    let mut client = RECT::default();
    let _ = unsafe { GetClientRect(hwnd, &mut client) };
    fill(hdc, &client, BACKGROUND);

    unsafe {
        let _ = SetBkMode(hdc, TRANSPARENT);
    }

    fonts.set_dpi(dpi);
    let margin = scale(MARGIN, dpi);
    let gap = scale(BLOCK_GAP, dpi);
    let mut y = margin;

    for item in items {
        match item {
            PaintItem::Rule => {
                let top = y - scroll + gap / 2;
                let rule = RECT {
                    left: margin,
                    top,
                    right: (client.right - margin).max(margin),
                    bottom: top + 1,
                };
                fill(hdc, &rule, RULE);
                y += gap;
            }
            PaintItem::Text {
                font,
                indent,
                spans,
                shaded,
            } => {
                let left = margin + scale(*indent, dpi);
                let right = (client.right - margin).max(left + 1);
                let row = line_height(hdc, fonts, *font, spans);
                let flow = layout::flow(spans, right - left, |text, style| {
                    text_size(hdc, fonts.get(font.with_style(style)), text).cx
                });
                let top = y - scroll;
                let height = flow.lines as i32 * row;

                if *shaded {
                    let pad = gap / 2;
                    let shade = RECT {
                        left: left - pad,
                        top: top - pad,
                        right: right + pad,
                        bottom: top + height + pad,
                    };
                    fill(hdc, &shade, CODE_SHADE);
                }

                for fragment in &flow.fragments {
                    let row_top = top + fragment.line as i32 * row;
                    if row_top + row < client.top || row_top > client.bottom {
                        continue;
                    }
                    let wide: Vec<u16> = fragment.text.encode_utf16().collect();
                    let color = if fragment.style.link { LINK } else { TEXT };
                    unsafe {
                        let previous =
                            SelectObject(hdc, HGDIOBJ::from(fonts.get(font.with_style(fragment.style))));
                        let _ = SetTextColor(hdc, color);
                        let _ = TextOutW(hdc, left + fragment.x, row_top, &wide);
                        let _ = SelectObject(hdc, previous);
                    }
                }

                y += height + gap;
            }
        }
    }

    unsafe {
        let _ = EndPaint(hwnd, &paint);
    }

    y + margin
}

fn fill(hdc: HDC, rect: &RECT, color: COLORREF) {
    unsafe {
        let brush: HBRUSH = CreateSolidBrush(color);
        let _ = FillRect(hdc, rect, brush);
        let _ = DeleteObject(HGDIOBJ::from(brush));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fonts_are_reused_until_the_dpi_changes() {
        let mut fonts = FontCache::new();
        fonts.set_dpi(96);
        let body = FontKind::Body.with_style(RunStyle::default());
        let bold = FontKind::Body.with_style(RunStyle {
            bold: true,
            ..RunStyle::default()
        });

        let first = fonts.get(body);
        assert_eq!(fonts.get(body), first);
        assert_ne!(fonts.get(bold), first);
        assert_eq!(fonts.fonts.len(), 2);

        fonts.set_dpi(96);
        assert_eq!(fonts.fonts.len(), 2);
        fonts.set_dpi(144);
        assert!(fonts.fonts.is_empty());
        fonts.get(body);
        assert_eq!(fonts.fonts.len(), 1);
    }
}
