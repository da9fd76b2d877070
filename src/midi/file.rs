//! Standard MIDI File document: header chunk plus the two track chunks

use super::defaults::{SMF_FORMAT, TRACK_COUNT};
use super::errors::EncodingError;
use super::primitives::{write_chunk_header, write_u16_be};
use super::track::Track;
use std::io::{self, Write};

/// Size of the complete `MThd` chunk
pub const HEADER_CHUNK_LEN: usize = 14;

/// Check that `ticks_per_quarter` fits the metrical division field.
/// The high bit of the field selects SMPTE timing, which is never written.
pub fn metrical_division(ticks_per_quarter: u32) -> Result<u16, EncodingError> {
    match u16::try_from(ticks_per_quarter) {
        Ok(division) if division <= 0x7FFF => Ok(division),
        _ => Err(EncodingError::DivisionOutOfRange(ticks_per_quarter)),
    }
}

/// A format 1 file with a conductor track and a performance track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiFile {
    division: u16,
    conductor: Track,
    performance: Track,
}

impl MidiFile {
    pub fn new(division: u16, conductor: Track, performance: Track) -> Self {
        Self {
            division,
            conductor,
            performance,
        }
    }

    pub fn format(&self) -> u16 {
        SMF_FORMAT
    }

    /// Ticks per quarter note
    pub fn division(&self) -> u16 {
        self.division
    }

    /// Tempo and time signature track
    pub fn conductor(&self) -> &Track {
        &self.conductor
    }

    /// Lyric and note track
    pub fn performance(&self) -> &Track {
        &self.performance
    }

    /// Tracks in file order
    pub fn tracks(&self) -> [&Track; 2] {
        [&self.conductor, &self.performance]
    }

    /// Total size of the serialized file
    pub fn encoded_len(&self) -> usize {
        HEADER_CHUNK_LEN + self.tracks().iter().map(|t| t.chunk_len()).sum::<usize>()
    }

    /// Serialize header, conductor chunk, then performance chunk in one pass
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let mut written = write_chunk_header(w, b"MThd", 6)?;
        written += write_u16_be(w, SMF_FORMAT)?;
        written += write_u16_be(w, TRACK_COUNT)?;
        written += write_u16_be(w, self.division)?;
        for track in self.tracks() {
            written += track.write_to(w)?;
        }
        Ok(written)
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.write_to(&mut out)?;
        Ok(out)
    }
}
