//! MusicXML to MIDI converter
//!
//! Reads a partwise MusicXML score and writes a format 1 Standard MIDI File
//! with a conductor track (tempo and time signatures) and a performance track
//! (notes with per-note lyric events, lyrics transcoded to a legacy charset).

pub mod charset;
pub mod converters;
pub mod midi;

// Re-export commonly used types
pub use charset::{CharsetText, TextEncoder, Utf8Text};
pub use converters::musicxml::{
    convert_file,
    default_output_path,
    musicxml_to_midi,
    parse_musicxml,
    translate,
    ConversionSettings,
    MxError,
    Score,
};
pub use midi::{EncodingError, MidiFile};
