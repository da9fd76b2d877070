// SMF encoder tests against an independent reader
//
// Tracks are assembled through the public builder API and parsed back with
// midly, so the variable-length deltas and chunk lengths are checked by code
// that shares nothing with the encoder.

use midly::num::u24;
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use mxl2mid::midi::{EncodingError, MidiEvent, MidiFile, TextKind, TrackBuilder};
use mxl2mid::Utf8Text;

fn note_on(key: u8) -> MidiEvent {
    MidiEvent::NoteOn { channel: 0, key, velocity: 100 }
}

fn note_off(key: u8) -> MidiEvent {
    MidiEvent::NoteOff { channel: 0, key, velocity: 0 }
}

#[test]
fn test_deltas_of_every_vlq_length_survive_parsing() {
    let deltas = [0u32, 0x7F, 0x80, 0x3FFF, 0x4000, 0x1F_FFFF, 0x20_0000, 0x0FFF_FFFF];

    let mut performance = TrackBuilder::new();
    for (i, &delta) in deltas.iter().enumerate() {
        performance.add_delta_time(delta).unwrap();
        performance.add_event(note_on(40 + i as u8));
    }
    let file = MidiFile::new(480, TrackBuilder::new().finish(), performance.finish());
    let bytes = file.to_bytes().unwrap();
    assert_eq!(bytes.len(), file.encoded_len());

    let smf = Smf::parse(&bytes).expect("Output should be a valid SMF");
    let parsed: Vec<u32> = smf.tracks[1].iter().map(|e| e.delta.as_int()).collect();
    let mut expected = deltas.to_vec();
    expected.push(0); // end of track
    assert_eq!(parsed, expected);
}

#[test]
fn test_meta_events_parse_back() {
    let mut conductor = TrackBuilder::new();
    conductor.add_event(MidiEvent::time_signature(6, 8).unwrap());
    conductor.add_event(MidiEvent::tempo(72.5).unwrap());
    conductor.add_delta_time(1_000).unwrap();

    let mut performance = TrackBuilder::new();
    performance.add_event(MidiEvent::text(TextKind::TrackName, b"Vocal".to_vec()).unwrap());
    performance.add_event(MidiEvent::lyric("hel", &Utf8Text).unwrap());
    performance.add_event(note_on(67));
    performance.add_delta_time(1_000).unwrap();
    performance.add_event(note_off(67));

    let bytes = MidiFile::new(960, conductor.finish(), performance.finish())
        .to_bytes()
        .unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let conductor: Vec<TrackEventKind> = smf.tracks[0].iter().map(|e| e.kind).collect();
    assert_eq!(
        conductor,
        vec![
            TrackEventKind::Meta(MetaMessage::TimeSignature(6, 3, 24, 8)),
            // 60e6 / 72.5 = 827586.2 -> 827586
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(827_586))),
            TrackEventKind::Meta(MetaMessage::EndOfTrack),
        ]
    );

    let performance: Vec<TrackEventKind> = smf.tracks[1].iter().map(|e| e.kind).collect();
    assert_eq!(performance[0], TrackEventKind::Meta(MetaMessage::TrackName(&b"Vocal"[..])));
    assert_eq!(performance[1], TrackEventKind::Meta(MetaMessage::Lyric(&b"hel"[..])));
    assert!(matches!(
        performance[2],
        TrackEventKind::Midi { message: MidiMessage::NoteOn { key, vel }, .. }
            if key.as_int() == 67 && vel.as_int() == 100
    ));
    assert!(matches!(
        performance[3],
        TrackEventKind::Midi { message: MidiMessage::NoteOff { key, vel }, .. }
            if key.as_int() == 67 && vel.as_int() == 0
    ));
}

#[test]
fn test_longest_lyric_fits() {
    let text = "a".repeat(255);
    let mut performance = TrackBuilder::new();
    performance.add_event(MidiEvent::lyric(&text, &Utf8Text).unwrap());
    let bytes = MidiFile::new(480, TrackBuilder::new().finish(), performance.finish())
        .to_bytes()
        .unwrap();

    let smf = Smf::parse(&bytes).unwrap();
    match smf.tracks[1][0].kind {
        TrackEventKind::Meta(MetaMessage::Lyric(lyric)) => assert_eq!(lyric.len(), 255),
        other => panic!("expected lyric, got {:?}", other),
    }

    assert_eq!(
        MidiEvent::lyric(&"a".repeat(256), &Utf8Text),
        Err(EncodingError::TextTooLong(256))
    );
}

#[test]
fn test_out_of_range_values_are_rejected() {
    assert_eq!(MidiEvent::time_signature(4, 3), Err(EncodingError::UnsupportedDenominator(3)));
    assert_eq!(MidiEvent::time_signature(4, 256), Err(EncodingError::UnsupportedDenominator(256)));
    assert_eq!(MidiEvent::time_signature(300, 4), Err(EncodingError::NumeratorOutOfRange(300)));
    assert!(matches!(MidiEvent::tempo(0.0), Err(EncodingError::InvalidTempo(_))));
    assert!(matches!(MidiEvent::tempo(f64::NAN), Err(EncodingError::InvalidTempo(_))));
    // Slower than ~3.58 bpm needs more than 24 bits
    assert!(matches!(MidiEvent::tempo(3.0), Err(EncodingError::TempoOutOfRange(_))));
}
