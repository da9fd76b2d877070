use crate::charset::TextEncoder;
use crate::converters::musicxml::musicxml_to_midi::{model::*, MxError, Result};
use crate::midi::defaults::{NOTE_CHANNEL, NOTE_OFF_VELOCITY, NOTE_ON_VELOCITY};
use crate::midi::{metrical_division, EncodingError, MidiEvent, MidiFile, Track, TrackBuilder};
use log::{debug, info, warn};

/// Translate the first part of `score` into a two-track MIDI file.
///
/// Score divisions become ticks per quarter note, so durations carry over
/// unscaled.
pub fn translate(score: &Score, encoder: &dyn TextEncoder) -> Result<MidiFile> {
    let part = score
        .parts
        .first()
        .ok_or_else(|| MxError::Invalid("score has no parts".to_string()))?;
    if score.parts.len() > 1 {
        warn!(
            "score has {} parts; only part {} is converted",
            score.parts.len(),
            part.id
        );
    }

    let divisions = score.find_divisions();
    if divisions == 0 {
        warn!("no non-zero <divisions> in score; writing division 0");
    }
    let division = metrical_division(divisions)?;

    let conductor = build_conductor_track(part)?;
    let performance = build_performance_track(part, encoder)?;
    info!(
        "part {}: {} measure(s), {} ticks at division {}, lyrics as {}",
        part.id,
        part.measures.len(),
        performance.duration(),
        division,
        encoder.name()
    );

    Ok(MidiFile::new(division, conductor, performance))
}

/// Time signatures and tempo changes, with note durations as the only
/// source of elapsed time
pub fn build_conductor_track(part: &Part) -> Result<Track> {
    let mut track = TrackBuilder::new();

    for measure in &part.measures {
        if let Some(time) = measure.time_signature() {
            debug!("measure {}: time {}/{}", measure.number, time.beats, time.beat_type);
            track.add_event(MidiEvent::time_signature(time.beats, time.beat_type).map_err(at(measure))?);
        }

        for event in &measure.events {
            match event {
                MeasureEvent::Sound(sound) => {
                    debug!("measure {}: tempo {}", measure.number, sound.tempo);
                    track.add_event(MidiEvent::tempo(sound.tempo).map_err(at(measure))?);
                }
                MeasureEvent::Note(note) => {
                    track.add_delta_time(note.duration).map_err(at(measure))?;
                }
            }
        }
    }

    Ok(track.finish())
}

/// Lyrics and notes. Tied segments extend the first segment's sound: only
/// the first attacks (lyric + note-on) and only the last releases.
pub fn build_performance_track(part: &Part, encoder: &dyn TextEncoder) -> Result<Track> {
    let mut track = TrackBuilder::new();

    for measure in &part.measures {
        for note in measure.notes() {
            if note.is_rest {
                track.add_delta_time(note.duration).map_err(at(measure))?;
                continue;
            }
            let Some(pitch) = &note.pitch else {
                warn!("measure {}: skipping note with neither pitch nor rest", measure.number);
                continue;
            };

            let key = midi_key(pitch).map_err(at(measure))?;
            if note.tie.attacks() {
                debug!("measure {}: {} (key {}) for {} ticks", measure.number, pitch, key, note.duration);
                let lyric = note.lyric.as_deref().unwrap_or("");
                track.add_event(MidiEvent::lyric(lyric, encoder).map_err(at(measure))?);
                track.add_event(MidiEvent::NoteOn {
                    channel: NOTE_CHANNEL,
                    key,
                    velocity: NOTE_ON_VELOCITY,
                });
            }

            track.add_delta_time(note.duration).map_err(at(measure))?;

            if note.tie.releases() {
                track.add_event(MidiEvent::NoteOff {
                    channel: NOTE_CHANNEL,
                    key,
                    velocity: NOTE_OFF_VELOCITY,
                });
            }
        }
        debug!("measure {}: {} event(s) so far", measure.number, track.len());
    }

    if track.is_empty() {
        warn!("part {}: no sounding notes", part.id);
    }
    Ok(track.finish())
}

fn midi_key(pitch: &Pitch) -> std::result::Result<u8, EncodingError> {
    let key = pitch.key();
    u8::try_from(key)
        .ok()
        .filter(|&k| k <= 127)
        .ok_or(EncodingError::KeyOutOfRange(key))
}

/// Attach the measure number to an encoding failure
fn at(measure: &Measure) -> impl FnOnce(EncodingError) -> MxError + '_ {
    move |source| MxError::EncodingAt {
        measure: measure.number.clone(),
        source,
    }
}
