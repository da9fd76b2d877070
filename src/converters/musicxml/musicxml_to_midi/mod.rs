mod model;
mod parse;
mod settings;
mod translate;

pub use model::*;
pub use parse::parse_musicxml;
pub use settings::ConversionSettings;
pub use translate::{build_conductor_track, build_performance_track, translate};

use crate::midi::EncodingError;
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MxError {
    #[error("xml parse error at byte {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("invalid musicxml: {0}")]
    Invalid(String),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error("measure {measure}: {source}")]
    EncodingAt {
        measure: String,
        #[source]
        source: EncodingError,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, MxError>;

/// Convert MusicXML bytes to SMF (Standard MIDI File) bytes
///
/// # Arguments
/// * `xml` - MusicXML document as bytes
/// * `settings` - Lyric charset selection
///
/// # Returns
/// * Format 1 MIDI file bytes: conductor track, then performance track
pub fn musicxml_to_midi(xml: &[u8], settings: &ConversionSettings) -> Result<Vec<u8>> {
    let encoder = settings.text_encoder()?;
    let score = parse_musicxml(xml)?;
    let file = translate(&score, encoder.as_ref())?;
    Ok(file.to_bytes()?)
}

/// Convert the MusicXML file at `input` and write the MIDI file to `output`,
/// or to [`default_output_path`] when `output` is `None`.
///
/// Nothing is written unless the whole conversion succeeds.
///
/// # Returns
/// * The path written
pub fn convert_file(
    input: &Path,
    output: Option<&Path>,
    settings: &ConversionSettings,
) -> Result<PathBuf> {
    let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
    let xml = fs::read(input)?;
    let bytes = musicxml_to_midi(&xml, settings)?;
    fs::write(&output, &bytes)?;
    info!("wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(output)
}

/// `INPUT.mid` next to the input file (`song.xml` -> `song.xml.mid`)
pub fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".mid");
    PathBuf::from(name)
}
