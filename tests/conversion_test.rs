// MusicXML -> MIDI conversion tests
//
// Output is read back with midly, an independent SMF parser, so chunk
// lengths, delta times and event layouts are checked from the outside.

use midly::num::u15;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use mxl2mid::{convert_file, musicxml_to_midi, ConversionSettings, MxError};
use std::fs;

/// Simplified view of a track event: (absolute tick, description)
fn timeline(track: &[midly::TrackEvent]) -> Vec<(u32, String)> {
    let mut tick = 0;
    track
        .iter()
        .map(|event| {
            tick += event.delta.as_int();
            let desc = match event.kind {
                TrackEventKind::Midi { channel, message } => match message {
                    MidiMessage::NoteOn { key, vel } => {
                        format!("on ch{} {} {}", channel.as_int(), key.as_int(), vel.as_int())
                    }
                    MidiMessage::NoteOff { key, vel } => {
                        format!("off ch{} {} {}", channel.as_int(), key.as_int(), vel.as_int())
                    }
                    other => format!("{:?}", other),
                },
                TrackEventKind::Meta(MetaMessage::Lyric(bytes)) => {
                    format!("lyric {}", String::from_utf8_lossy(bytes))
                }
                TrackEventKind::Meta(MetaMessage::Tempo(micros)) => format!("tempo {}", micros.as_int()),
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, pow2, clocks, n32)) => {
                    format!("time {}/{} {} {}", num, 1u32 << pow2, clocks, n32)
                }
                TrackEventKind::Meta(MetaMessage::EndOfTrack) => "end".to_string(),
                other => format!("{:?}", other),
            };
            (tick, desc)
        })
        .collect()
}

fn convert(xml: &str) -> Vec<u8> {
    musicxml_to_midi(xml.as_bytes(), &ConversionSettings::raw()).expect("Conversion should succeed")
}

fn score(measures: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 2.0 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise>
  <identification>
    <encoding><software>Test Suite</software></encoding>
  </identification>
  <part-list>
    <score-part id="P1"><part-name>Vocal</part-name></score-part>
  </part-list>
  <part id="P1">
{}
  </part>
</score-partwise>"#,
        measures
    )
}

fn note(step: &str, octave: i32, duration: u32, extra: &str) -> String {
    format!(
        "<note><pitch><step>{}</step><octave>{}</octave></pitch><duration>{}</duration>{}</note>",
        step, octave, duration, extra
    )
}

fn lyric(text: &str) -> String {
    format!("<lyric number=\"1\"><syllabic>single</syllabic><text>{}</text></lyric>", text)
}

const HEADER_ATTRIBUTES: &str =
    "<attributes><divisions>480</divisions><time><beats>4</beats><beat-type>4</beat-type></time></attributes>";

#[test]
fn test_single_note_scenario() {
    let xml = score(&format!(
        r#"<measure number="1">{}<sound tempo="120"/>{}</measure>"#,
        HEADER_ATTRIBUTES,
        note("C", 4, 480, &lyric("la"))
    ));
    let bytes = convert(&xml);
    let smf = Smf::parse(&bytes).expect("Output should be a valid SMF");

    assert_eq!(smf.header.format, Format::Parallel);
    assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
    assert_eq!(smf.tracks.len(), 2);

    assert_eq!(
        timeline(&smf.tracks[0]),
        vec![
            (0, "time 4/4 24 8".to_string()),
            (0, "tempo 500000".to_string()),
            (480, "end".to_string()),
        ]
    );
    assert_eq!(
        timeline(&smf.tracks[1]),
        vec![
            (0, "lyric la".to_string()),
            (0, "on ch0 60 100".to_string()),
            (480, "off ch0 60 0".to_string()),
            (480, "end".to_string()),
        ]
    );
}

#[test]
fn test_tied_melody_with_rests() {
    // | C4 half tied to C4 quarter, rest quarter | D4 tied through three segments |
    let xml = score(&format!(
        r#"<measure number="1">{}<sound tempo="90"/>
      {}
      {}
      <note><rest/><duration>480</duration></note>
    </measure>
    <measure number="2">
      {}
      {}
      {}
    </measure>"#,
        HEADER_ATTRIBUTES,
        note("C", 4, 960, &format!("<tie type=\"start\"/>{}", lyric("sa"))),
        note("C", 4, 480, "<tie type=\"stop\"/>"),
        note("D", 4, 480, &format!("<tie type=\"start\"/>{}", lyric("ku"))),
        note("D", 4, 960, "<tie type=\"stop\"/><tie type=\"start\"/>"),
        note("D", 4, 480, "<tie type=\"stop\"/>"),
    ));
    let smf_bytes = convert(&xml);
    let smf = Smf::parse(&smf_bytes).unwrap();

    assert_eq!(
        timeline(&smf.tracks[1]),
        vec![
            (0, "lyric sa".to_string()),
            (0, "on ch0 60 100".to_string()),
            (1440, "off ch0 60 0".to_string()),
            (1920, "lyric ku".to_string()),
            (1920, "on ch0 62 100".to_string()),
            (3840, "off ch0 62 0".to_string()),
            (3840, "end".to_string()),
        ]
    );
    // Conductor and performance tracks cover the same span
    assert_eq!(timeline(&smf.tracks[0]).last().unwrap().0, 3840);
}

#[test]
fn test_tempo_and_meter_changes() {
    let xml = score(&format!(
        r#"<measure number="1">{}<sound tempo="120"/>{}</measure>
    <measure number="2">
      <attributes><time><beats>3</beats><beat-type>8</beat-type></time></attributes>
      <sound tempo="60"/>
      <note><rest/><duration>720</duration></note>
    </measure>"#,
        HEADER_ATTRIBUTES,
        note("A", 4, 1920, &lyric("a")),
    ));
    let smf_bytes = convert(&xml);
    let smf = Smf::parse(&smf_bytes).unwrap();

    assert_eq!(
        timeline(&smf.tracks[0]),
        vec![
            (0, "time 4/4 24 8".to_string()),
            (0, "tempo 500000".to_string()),
            (1920, "time 3/8 24 8".to_string()),
            (1920, "tempo 1000000".to_string()),
            (2640, "end".to_string()),
        ]
    );
}

#[test]
fn test_shift_jis_lyrics() {
    let xml = score(&format!(
        r#"<measure number="1">{}{}{}</measure>"#,
        HEADER_ATTRIBUTES,
        note("E", 4, 480, &lyric("さ")),
        note("E", 4, 480, &lyric("くら")),
    ));
    let bytes = musicxml_to_midi(xml.as_bytes(), &ConversionSettings::default()).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    let lyrics: Vec<&[u8]> = smf.tracks[1]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Lyric(bytes)) => Some(bytes),
            _ => None,
        })
        .collect();
    assert_eq!(lyrics, vec![&[0x82u8, 0xB3][..], &[0x82u8, 0xAD, 0x82, 0xE7][..]]);
}

#[test]
fn test_unmappable_lyric_is_an_error() {
    let xml = score(&format!(
        r#"<measure number="5">{}{}</measure>"#,
        HEADER_ATTRIBUTES,
        note("E", 4, 480, &lyric("♬🎤")),
    ));
    let err = musicxml_to_midi(xml.as_bytes(), &ConversionSettings::default()).unwrap_err();
    assert!(err.to_string().starts_with("measure 5:"), "got {}", err);
}

#[test]
fn test_convert_file_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("song.xml");
    fs::write(
        &input,
        score(&format!(r#"<measure number="1">{}{}</measure>"#, HEADER_ATTRIBUTES, note("G", 4, 480, ""))),
    )
    .unwrap();

    let written = convert_file(&input, None, &ConversionSettings::default()).unwrap();
    assert_eq!(written, dir.path().join("song.xml.mid"));

    let bytes = fs::read(&written).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);
}

#[test]
fn test_convert_file_explicit_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.musicxml");
    let output = dir.path().join("out.mid");
    fs::write(&input, score(r#"<measure number="1"><note><rest/><duration>4</duration></note></measure>"#))
        .unwrap();

    let written = convert_file(&input, Some(&output), &ConversionSettings::default()).unwrap();
    assert_eq!(written, output);
    assert!(output.exists());
    assert!(!dir.path().join("in.musicxml.mid").exists());
}

#[test]
fn test_failed_conversion_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.xml");
    let output = dir.path().join("bad.mid");
    fs::write(
        &input,
        score(r#"<measure number="1"><attributes><time><beats>3</beats><beat-type>5</beat-type></time></attributes></measure>"#),
    )
    .unwrap();

    let err = convert_file(&input, Some(&output), &ConversionSettings::default()).unwrap_err();
    assert!(matches!(err, MxError::EncodingAt { .. }));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = convert_file(&dir.path().join("missing.xml"), None, &ConversionSettings::default())
        .unwrap_err();
    assert!(matches!(err, MxError::Io(_)));
}

#[test]
fn test_long_lyric_keeps_following_events() {
    // 128 bytes needs a two-byte length; the note events after it must still parse
    let text = "a".repeat(128);
    let xml = score(&format!(
        r#"<measure number="1">{}{}</measure>"#,
        HEADER_ATTRIBUTES,
        note("C", 4, 480, &lyric(&text)),
    ));
    let bytes = convert(&xml);
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(
        timeline(&smf.tracks[1]),
        vec![
            (0, format!("lyric {}", text)),
            (0, "on ch0 60 100".to_string()),
            (480, "off ch0 60 0".to_string()),
            (480, "end".to_string()),
        ]
    );
}
