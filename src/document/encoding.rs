use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_name: &'static str,
}

/// Decodes file bytes into editor text. BOMs win, then strict UTF-8, then
/// Windows-1252 for legacy files.
pub fn decode_text(bytes: &[u8]) -> DecodedText {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return decode_with(rest, UTF_8);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_with(rest, UTF_16LE);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_with(rest, UTF_16BE);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding_name: UTF_8.name(),
        };
    }

    decode_with(bytes, WINDOWS_1252)
}

/// Saved documents are always plain UTF-8 with no BOM.
pub fn encode_text(text: &str) -> &[u8] {
    text.as_bytes()
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedText {
    let (text, _had_errors) = encoding.decode_without_bom_handling(bytes);
    DecodedText {
        text: text.into_owned(),
        encoding_name: encoding.name(),
    }
}
