//! Error types for SMF event encoding
//!
//! Every variant is terminal for the event being built: the converter does not
//! substitute values or skip events, the whole conversion fails.

use thiserror::Error;

/// An event value that cannot be represented in a Standard MIDI File
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// Time signature denominator is not a power of two in 1..=128
    #[error("unsupported time signature denominator {0}")]
    UnsupportedDenominator(u32),

    /// Time signature numerator does not fit in a data byte
    #[error("time signature numerator {0} is out of range")]
    NumeratorOutOfRange(u32),

    /// Tempo is zero, negative or not a number
    #[error("invalid tempo {0} bpm")]
    InvalidTempo(f64),

    /// Tempo outside the 1..=0xFFFFFF microseconds-per-quarter range
    #[error("tempo {0} bpm is outside the encodable range")]
    TempoOutOfRange(f64),

    /// Meta event text longer than 255 bytes
    #[error("meta text is {0} bytes long, the limit is 255")]
    TextTooLong(usize),

    /// Accumulated delta time exceeds the 28-bit variable-length quantity range
    #[error("delta time {0} exceeds the variable-length quantity range")]
    DeltaOverflow(u64),

    /// Computed note number outside 0-127
    #[error("note key {0} is outside the MIDI range 0-127")]
    KeyOutOfRange(i32),

    /// Ticks per quarter note outside the metrical (non-SMPTE) range
    #[error("division {0} is outside the range 0-32767")]
    DivisionOutOfRange(u32),

    /// Text contains a character the target charset cannot represent
    #[error("{charset} cannot encode {text:?}")]
    Unmappable { charset: &'static str, text: String },

    /// Charset label not recognised
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),
}
