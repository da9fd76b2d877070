//! MusicXML format converters
//!
//! This module contains converters for MusicXML format.

pub mod musicxml_to_midi;

// Re-export for convenience
pub use musicxml_to_midi::{
    convert_file,
    default_output_path,
    musicxml_to_midi,
    parse_musicxml,
    translate,
    ConversionSettings,
    MxError,
    Score,
};
