use crate::charset::{CharsetText, TextEncoder, Utf8Text};
use crate::midi::defaults::DEFAULT_CHARSET;
use crate::midi::EncodingError;
use serde::{Deserialize, Serialize};

/// Configuration options for conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Charset label for lyric text, or `None` to write UTF-8 bytes unchanged
    pub charset: Option<String>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            charset: Some(DEFAULT_CHARSET.to_string()),
        }
    }
}

impl ConversionSettings {
    pub fn with_charset(label: &str) -> Self {
        Self {
            charset: Some(label.to_string()),
        }
    }

    /// Lyrics are written as UTF-8
    pub fn raw() -> Self {
        Self { charset: None }
    }

    /// Resolve the configured charset
    pub fn text_encoder(&self) -> Result<Box<dyn TextEncoder>, EncodingError> {
        match &self.charset {
            Some(label) => Ok(Box::new(CharsetText::for_label(label)?)),
            None => Ok(Box::new(Utf8Text)),
        }
    }
}
