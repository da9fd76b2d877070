//! Lyric text transcoding
//!
//! MIDI meta text has no declared encoding; players assume the charset of
//! their locale. [`TextEncoder`] turns score text into the bytes written to
//! the file and is passed explicitly to the translator.

use crate::midi::EncodingError;
use encoding_rs::Encoding;
use std::borrow::Cow;

pub trait TextEncoder {
    /// Encode `text` for a meta event payload.
    /// Characters the target charset cannot represent are an error, never replaced.
    fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodingError>;

    /// Charset name for logs
    fn name(&self) -> &str;
}

/// Writes the UTF-8 bytes of the text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Text;

impl TextEncoder for Utf8Text {
    fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodingError> {
        Ok(Cow::Borrowed(text.as_bytes()))
    }

    fn name(&self) -> &str {
        "UTF-8"
    }
}

/// Transcodes into a legacy charset looked up by WHATWG label
#[derive(Debug, Clone, Copy)]
pub struct CharsetText {
    encoding: &'static Encoding,
}

impl CharsetText {
    /// Look up a charset by label (`"Shift_JIS"`, `"sjis"`, `"EUC-KR"`, ...)
    pub fn for_label(label: &str) -> Result<Self, EncodingError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|encoding| CharsetText { encoding })
            .ok_or_else(|| EncodingError::UnknownCharset(label.to_string()))
    }
}

impl TextEncoder for CharsetText {
    fn encode<'a>(&self, text: &'a str) -> Result<Cow<'a, [u8]>, EncodingError> {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(EncodingError::Unmappable {
                charset: self.encoding.name(),
                text: text.to_string(),
            });
        }
        Ok(bytes)
    }

    fn name(&self) -> &str {
        self.encoding.name()
    }
}
