//! Score model for MusicXML → MIDI conversion
//!
//! Mirrors the partwise MusicXML tree only as far as the converter needs it:
//! parts, measures, attributes, tempo marks and single-voice notes with ties
//! and lyrics. Times stay in MusicXML divisions; they become MIDI ticks 1:1.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Score {
    pub identification: Identification,
    pub parts: Vec<Part>,
}

impl Score {
    /// First non-zero `<divisions>` in document order (all parts), or 0
    pub fn find_divisions(&self) -> u32 {
        self.parts
            .iter()
            .flat_map(|part| part.measures.iter())
            .filter_map(|measure| measure.attributes.as_ref()?.divisions)
            .find(|&divisions| divisions != 0)
            .unwrap_or(0)
    }
}

/// Informational header data, logged but not written to the MIDI file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identification {
    pub title: Option<String>,
    pub composer: Option<String>,
    pub software: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Part {
    pub id: String,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Measure {
    /// `number` attribute, or the 1-based position when absent
    pub number: String,
    pub attributes: Option<Attributes>,
    pub events: Vec<MeasureEvent>,
}

impl Measure {
    /// Time signature that starts in this measure, if any
    pub fn time_signature(&self) -> Option<&TimeSig> {
        self.attributes
            .as_ref()?
            .time
            .as_ref()
            .filter(|time| time.beats != 0)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.events.iter().filter_map(|event| match event {
            MeasureEvent::Note(note) => Some(note),
            MeasureEvent::Sound(_) => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub divisions: Option<u32>,
    pub time: Option<TimeSig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSig {
    pub beats: u32,     // Numerator (e.g., 3 in 3/4)
    pub beat_type: u32, // Denominator (e.g., 4 in 3/4)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MeasureEvent {
    Sound(Sound),
    Note(Note),
}

/// `<sound tempo="..."/>`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
    pub tempo: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Note {
    pub duration: u32, // In divisions
    pub pitch: Option<Pitch>,
    pub is_rest: bool,
    pub tie: Tie,
    pub lyric: Option<String>,
}

impl Note {
    pub fn rest(duration: u32) -> Self {
        Note {
            duration,
            is_rest: true,
            ..Default::default()
        }
    }

    pub fn pitched(pitch: Pitch, duration: u32) -> Self {
        Note {
            duration,
            pitch: Some(pitch),
            ..Default::default()
        }
    }

    pub fn with_tie(mut self, tie: Tie) -> Self {
        self.tie = tie;
        self
    }

    pub fn with_lyric(mut self, text: &str) -> Self {
        self.lyric = Some(text.to_string());
        self
    }
}

/// Sound-level tie state of a note (`<tie type="..."/>`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tie {
    #[default]
    None,
    /// First segment of a tied group
    Start,
    /// Last segment of a tied group
    Stop,
    /// Middle segment: tied to both neighbours
    Both,
}

impl Tie {
    /// Whether this segment begins a sound (lyric + note-on)
    pub fn attacks(self) -> bool {
        !matches!(self, Tie::Stop | Tie::Both)
    }

    /// Whether this segment ends a sound (note-off)
    pub fn releases(self) -> bool {
        !matches!(self, Tie::Start | Tie::Both)
    }

    /// Combine the `type` attributes of a note's `<tie>` elements.
    /// Types other than `start`/`stop` do not tie the note.
    pub fn from_types<'a>(types: impl IntoIterator<Item = &'a str>) -> Tie {
        let (mut start, mut stop) = (false, false);
        for ty in types {
            match ty {
                "start" => start = true,
                "stop" => stop = true,
                _ => {}
            }
        }
        match (start, stop) {
            (true, true) => Tie::Both,
            (true, false) => Tie::Start,
            (false, true) => Tie::Stop,
            (false, false) => Tie::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pitch {
    pub step: Step,
    pub alter: i8, // Semitones (-1 = flat, 1 = sharp)
    pub octave: i8, // C4 = middle C
}

impl Pitch {
    pub fn new(step: Step, alter: i8, octave: i8) -> Self {
        Pitch { step, alter, octave }
    }

    /// MIDI note number, unclamped (C4 = 60)
    pub fn key(&self) -> i32 {
        self.step.semitone() + (i32::from(self.octave) + 1) * 12 + i32::from(self.alter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Step {
    /// Semitones above C
    pub fn semitone(self) -> i32 {
        match self {
            Step::C => 0,
            Step::D => 2,
            Step::E => 4,
            Step::F => 5,
            Step::G => 7,
            Step::A => 9,
            Step::B => 11,
        }
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "C" => Ok(Step::C),
            "D" => Ok(Step::D),
            "E" => Ok(Step::E),
            "F" => Ok(Step::F),
            "G" => Ok(Step::G),
            "A" => Ok(Step::A),
            "B" => Ok(Step::B),
            other => Err(format!("unknown pitch step {:?}", other)),
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let accidental = match self.alter {
            a if a > 0 => "#".repeat(a as usize),
            a if a < 0 => "b".repeat(a.unsigned_abs() as usize),
            _ => String::new(),
        };
        write!(f, "{:?}{}{}", self.step, accidental, self.octave)
    }
}
