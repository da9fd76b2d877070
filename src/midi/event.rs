//! MIDI events written by the converter
//!
//! A closed set of channel and meta events. Each variant reports its encoded
//! size (without the delta-time prefix) and serializes itself, so a track can
//! compute its chunk length before writing anything.
//!
//! Values are validated when an event is constructed through one of the
//! checked constructors. [`MidiEvent::write_to`] fails only on I/O or on a
//! hand-built variant whose tempo or text does not fit its field.

use super::defaults::{CLOCKS_PER_CLICK, THIRTY_SECONDS_PER_QUARTER};
use super::errors::EncodingError;
use super::primitives::{vlq_len, write_bytes, write_u24_be, write_vlq};
use crate::charset::TextEncoder;
use std::io::{self, Write};

const META: u8 = 0xFF;
const META_TEMPO: u8 = 0x51;
const META_TIME_SIGNATURE: u8 = 0x58;
const META_END_OF_TRACK: u8 = 0x2F;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// Largest microseconds-per-quarter value a tempo event can carry
pub const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;

/// Maximum text payload of a text meta event
pub const MAX_TEXT_LEN: usize = 255;

/// Meta event type byte for text-like events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TextKind {
    Text = 0x01,
    TrackName = 0x03,
    Lyric = 0x05,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    /// Microseconds per quarter note (24 bits)
    Tempo { micros_per_quarter: u32 },
    /// Denominator stored as its power of two, as written to the file
    TimeSignature { numerator: u8, denominator_pow2: u8 },
    Text { kind: TextKind, bytes: Vec<u8> },
    EndOfTrack,
}

impl MidiEvent {
    /// Tempo event for `bpm` quarter notes per minute.
    ///
    /// Microseconds per quarter note are `round(60_000_000 / bpm)`.
    pub fn tempo(bpm: f64) -> Result<Self, EncodingError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(EncodingError::InvalidTempo(bpm));
        }
        let micros = (60_000_000.0 / bpm).round();
        if micros < 1.0 || micros > f64::from(MAX_TEMPO_MICROS) {
            return Err(EncodingError::TempoOutOfRange(bpm));
        }
        Ok(MidiEvent::Tempo {
            micros_per_quarter: micros as u32,
        })
    }

    /// Time signature event; `denominator` is the notated value (4 in 3/4)
    pub fn time_signature(numerator: u32, denominator: u32) -> Result<Self, EncodingError> {
        let numerator =
            u8::try_from(numerator).map_err(|_| EncodingError::NumeratorOutOfRange(numerator))?;
        let denominator_pow2 = match denominator {
            1 => 0,
            2 => 1,
            4 => 2,
            8 => 3,
            16 => 4,
            32 => 5,
            64 => 6,
            128 => 7,
            other => return Err(EncodingError::UnsupportedDenominator(other)),
        };
        Ok(MidiEvent::TimeSignature {
            numerator,
            denominator_pow2,
        })
    }

    /// Text meta event from already-encoded bytes
    pub fn text(kind: TextKind, bytes: Vec<u8>) -> Result<Self, EncodingError> {
        if bytes.len() > MAX_TEXT_LEN {
            return Err(EncodingError::TextTooLong(bytes.len()));
        }
        Ok(MidiEvent::Text { kind, bytes })
    }

    /// Lyric meta event, transcoded through `encoder`.
    /// The length limit applies to the transcoded bytes.
    pub fn lyric(text: &str, encoder: &dyn TextEncoder) -> Result<Self, EncodingError> {
        let bytes = encoder.encode(text)?;
        Self::text(TextKind::Lyric, bytes.into_owned())
    }

    /// Encoded size in bytes, excluding the delta time
    pub fn encoded_len(&self) -> usize {
        match self {
            MidiEvent::NoteOn { .. } | MidiEvent::NoteOff { .. } => 3,
            MidiEvent::Tempo { .. } => 6,
            MidiEvent::TimeSignature { .. } => 7,
            MidiEvent::Text { bytes, .. } => 2 + vlq_len(bytes.len() as u32) + bytes.len(),
            MidiEvent::EndOfTrack => 3,
        }
    }

    /// Serialize the event (without delta time).
    ///
    /// # Returns
    /// Number of bytes written, always equal to [`MidiEvent::encoded_len`]
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        match self {
            MidiEvent::NoteOn { channel, key, velocity } => {
                write_bytes(w, &[NOTE_ON | (channel & 0x0F), key & 0x7F, velocity & 0x7F])
            }
            MidiEvent::NoteOff { channel, key, velocity } => {
                write_bytes(w, &[NOTE_OFF | (channel & 0x0F), key & 0x7F, velocity & 0x7F])
            }
            MidiEvent::Tempo { micros_per_quarter } => {
                if *micros_per_quarter > MAX_TEMPO_MICROS {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("tempo of {} us does not fit in 24 bits", micros_per_quarter),
                    ));
                }
                Ok(write_bytes(w, &[META, META_TEMPO, 0x03])? + write_u24_be(w, *micros_per_quarter)?)
            }
            MidiEvent::TimeSignature { numerator, denominator_pow2 } => write_bytes(
                w,
                &[
                    META,
                    META_TIME_SIGNATURE,
                    0x04,
                    *numerator,
                    *denominator_pow2,
                    CLOCKS_PER_CLICK,
                    THIRTY_SECONDS_PER_QUARTER,
                ],
            ),
            MidiEvent::Text { kind, bytes } => {
                // Meta lengths are variable-length quantities: 128+ takes two bytes
                if bytes.len() > MAX_TEXT_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("meta text of {} bytes exceeds {}", bytes.len(), MAX_TEXT_LEN),
                    ));
                }
                Ok(write_bytes(w, &[META, *kind as u8])?
                    + write_vlq(w, bytes.len() as u32)?
                    + write_bytes(w, bytes)?)
            }
            MidiEvent::EndOfTrack => write_bytes(w, &[META, META_END_OF_TRACK, 0x00]),
        }
    }
}
