//! Fixed values written by the converter
//!
//! The source scores carry a single melodic line with lyrics, so every note
//! goes to one channel at one velocity.

/// SMF format 1: simultaneous tracks sharing one tempo map
pub const SMF_FORMAT: u16 = 1;

/// Conductor track plus performance track
pub const TRACK_COUNT: u16 = 2;

/// MIDI channel for every note (0-indexed)
pub const NOTE_CHANNEL: u8 = 0;

/// Note-on velocity
pub const NOTE_ON_VELOCITY: u8 = 100;

/// Note-off (release) velocity
pub const NOTE_OFF_VELOCITY: u8 = 0;

/// MIDI clocks per metronome click in time signature events
pub const CLOCKS_PER_CLICK: u8 = 0x18;

/// Notated 32nd notes per MIDI quarter note in time signature events
pub const THIRTY_SECONDS_PER_QUARTER: u8 = 0x08;

/// Charset for lyric text when none is configured.
/// Vocal synthesis tools reading these files expect Japanese Windows text.
pub const DEFAULT_CHARSET: &str = "Shift_JIS";
