//! Track assembly
//!
//! [`TrackBuilder`] accumulates the ticks that pass between emitted events;
//! silent stretches (rests, tied continuations) fold into the delta of the
//! next event. A finished [`Track`] always ends with exactly one end-of-track.

use super::errors::EncodingError;
use super::event::MidiEvent;
use super::primitives::{vlq_len, write_chunk_header, write_vlq, VLQ_MAX};
use std::io::{self, Write};

/// Size of the `MTrk` tag plus length field
pub const TRACK_HEADER_LEN: usize = 8;

/// An event with the ticks elapsed since the previous event in its track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEvent {
    pub delta: u32,
    pub event: MidiEvent,
}

impl DeltaEvent {
    pub fn encoded_len(&self) -> usize {
        vlq_len(self.delta) + self.event.encoded_len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    events: Vec<DeltaEvent>,
}

impl Track {
    pub fn events(&self) -> &[DeltaEvent] {
        &self.events
    }

    /// Byte length of the chunk payload (everything after the length field)
    pub fn payload_len(&self) -> usize {
        self.events.iter().map(DeltaEvent::encoded_len).sum()
    }

    /// Byte length of the whole `MTrk` chunk
    pub fn chunk_len(&self) -> usize {
        TRACK_HEADER_LEN + self.payload_len()
    }

    /// Sum of all deltas, i.e. the track's length in ticks
    pub fn duration(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.delta)).sum()
    }

    /// Serialize as an `MTrk` chunk.
    ///
    /// The payload length is computed before the header is written, so `w`
    /// does not need to be seekable.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<usize> {
        let payload_len = u32::try_from(self.payload_len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "track payload exceeds 4 GiB")
        })?;

        let mut written = write_chunk_header(w, b"MTrk", payload_len)?;
        for de in &self.events {
            written += write_vlq(w, de.delta)?;
            written += de.event.write_to(w)?;
        }
        debug_assert_eq!(written, TRACK_HEADER_LEN + payload_len as usize);
        Ok(written)
    }
}

#[derive(Debug, Default)]
pub struct TrackBuilder {
    pending: u32,
    events: Vec<DeltaEvent>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time without emitting an event
    pub fn add_delta_time(&mut self, ticks: u32) -> Result<(), EncodingError> {
        let total = u64::from(self.pending) + u64::from(ticks);
        if total > u64::from(VLQ_MAX) {
            return Err(EncodingError::DeltaOverflow(total));
        }
        self.pending = total as u32;
        Ok(())
    }

    /// Emit `event` at the accumulated delta and reset the accumulator
    pub fn add_event(&mut self, event: MidiEvent) {
        debug_assert!(
            event != MidiEvent::EndOfTrack,
            "end of track is appended by finish()"
        );
        self.events.push(DeltaEvent {
            delta: self.pending,
            event,
        });
        self.pending = 0;
    }

    /// Ticks accumulated since the last emitted event
    pub fn pending(&self) -> u32 {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Close the track with an end-of-track at the remaining delta
    pub fn finish(mut self) -> Track {
        self.events.push(DeltaEvent {
            delta: self.pending,
            event: MidiEvent::EndOfTrack,
        });
        Track {
            events: self.events,
        }
    }
}
