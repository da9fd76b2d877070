//! Standard MIDI File encoder
//!
//! Writes format 1 files byte-for-byte: variable-length delta times, chunk
//! headers with lengths computed up front, and the handful of channel and
//! meta events a lyric-bearing vocal line needs.
//!
//! # Usage
//! ```rust
//! use mxl2mid::midi::{MidiEvent, MidiFile, TrackBuilder};
//!
//! let mut conductor = TrackBuilder::new();
//! conductor.add_event(MidiEvent::tempo(120.0)?);
//! conductor.add_delta_time(480)?;
//! let file = MidiFile::new(480, conductor.finish(), TrackBuilder::new().finish());
//! assert_eq!(&file.to_bytes()?[..4], b"MThd");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod defaults;
pub mod errors;
pub mod event;
pub mod file;
pub mod primitives;
pub mod track;

pub use errors::EncodingError;
pub use event::{MidiEvent, TextKind};
pub use file::{metrical_division, MidiFile};
pub use track::{DeltaEvent, Track, TrackBuilder};
