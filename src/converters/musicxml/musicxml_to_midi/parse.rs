use crate::converters::musicxml::musicxml_to_midi::{model::*, MxError, Result};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use std::str::FromStr;

type XmlReader<'x> = Reader<&'x [u8]>;

/// Parse partwise MusicXML bytes into the score model.
///
/// Documents in a legacy charset (byte order mark or `encoding` in the XML
/// declaration) are decoded to UTF-8 first.
pub fn parse_musicxml(xml: &[u8]) -> Result<Score> {
    let xml = decode_document(xml)?;
    let mut reader = Reader::from_reader(xml.as_ref());
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match next_event(&mut reader, &mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"score-partwise" => {
                let score = parse_score(&mut reader)?;
                info!(
                    "parsed score {:?} ({} part(s), software {:?})",
                    score.identification.title.as_deref().unwrap_or(""),
                    score.parts.len(),
                    score.identification.software.as_deref().unwrap_or("unknown"),
                );
                return Ok(score);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"score-partwise" => {
                return Err(MxError::Invalid("score has no parts".to_string()));
            }
            Event::Start(ref e) | Event::Empty(ref e) => {
                return Err(MxError::Invalid(format!(
                    "expected <score-partwise> root element, found <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Event::Eof => return Err(MxError::Invalid("document has no root element".to_string())),
            _ => {}
        }
        buf.clear();
    }
}

fn parse_score(reader: &mut XmlReader) -> Result<Score> {
    let mut score = Score::default();
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"identification" => parse_identification(reader, &mut score.identification)?,
                b"movement-title" => score.identification.title = Some(read_text(reader)?),
                b"part" => {
                    let id = attribute(e, b"id")?.unwrap_or_else(|| format!("P{}", score.parts.len() + 1));
                    let part = parse_part(reader, id)?;
                    debug!("part {}: {} measure(s)", part.id, part.measures.len());
                    score.parts.push(part);
                }
                _ => skip_element(reader)?,
            },
            Event::Empty(ref e) if e.name().as_ref() == b"part" => {
                let id = attribute(e, b"id")?.unwrap_or_else(|| format!("P{}", score.parts.len() + 1));
                score.parts.push(Part { id, measures: Vec::new() });
            }
            Event::End(ref e) if e.name().as_ref() == b"score-partwise" => break,
            Event::Eof => return Err(unexpected_eof("score-partwise")),
            _ => {}
        }
        buf.clear();
    }

    if score.parts.is_empty() {
        return Err(MxError::Invalid("score has no parts".to_string()));
    }
    Ok(score)
}

fn parse_identification(reader: &mut XmlReader, ident: &mut Identification) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"creator" => {
                    let is_composer = attribute(e, b"type")?.map_or(true, |ty| ty == "composer");
                    let text = read_text(reader)?;
                    if is_composer && ident.composer.is_none() {
                        ident.composer = Some(text);
                    }
                }
                b"software" => ident.software = Some(read_text(reader)?),
                // <encoding> is a container; its children are handled here
                b"encoding" => {}
                _ => skip_element(reader)?,
            },
            Event::End(ref e) if e.name().as_ref() == b"identification" => break,
            Event::Eof => return Err(unexpected_eof("identification")),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn parse_part(reader: &mut XmlReader, id: String) -> Result<Part> {
    let mut part = Part { id, measures: Vec::new() };
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"measure" => {
                let number = measure_number(e, part.measures.len())?;
                part.measures.push(parse_measure(reader, number)?);
            }
            Event::Empty(ref e) if e.name().as_ref() == b"measure" => {
                let number = measure_number(e, part.measures.len())?;
                part.measures.push(Measure { number, ..Default::default() });
            }
            Event::Start(_) => skip_element(reader)?,
            Event::End(ref e) if e.name().as_ref() == b"part" => break,
            Event::Eof => return Err(unexpected_eof("part")),
            _ => {}
        }
        buf.clear();
    }
    Ok(part)
}

fn measure_number(e: &BytesStart, index: usize) -> Result<String> {
    Ok(attribute(e, b"number")?.unwrap_or_else(|| (index + 1).to_string()))
}

/// Parse the contents of a `<measure>`.
///
/// `<direction>` subtrees are skipped: the measure-level `<sound>` carries the
/// tempo. Other unrecognised elements are descended into.
fn parse_measure(reader: &mut XmlReader, number: String) -> Result<Measure> {
    let mut measure = Measure {
        number,
        attributes: None,
        events: Vec::new(),
    };
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"attributes" => {
                    let attrs = measure.attributes.get_or_insert_with(Attributes::default);
                    parse_attributes(reader, attrs, &measure.number)?;
                }
                b"note" => {
                    let note = parse_note(reader, &measure.number)?;
                    measure.events.push(MeasureEvent::Note(note));
                }
                b"sound" => {
                    if let Some(sound) = parse_sound(e, &measure.number)? {
                        measure.events.push(MeasureEvent::Sound(sound));
                    }
                    skip_element(reader)?;
                }
                b"direction" => skip_element(reader)?,
                _ => {}
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"sound" => {
                    if let Some(sound) = parse_sound(e, &measure.number)? {
                        measure.events.push(MeasureEvent::Sound(sound));
                    }
                }
                b"note" => measure.events.push(MeasureEvent::Note(Note::default())),
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"measure" => break,
            Event::Eof => return Err(unexpected_eof("measure")),
            _ => {}
        }
        buf.clear();
    }
    Ok(measure)
}

/// `<sound tempo="..."/>`; a sound without tempo (dynamics, instrument
/// changes) is not an event
fn parse_sound(e: &BytesStart, measure: &str) -> Result<Option<Sound>> {
    match attribute(e, b"tempo")? {
        Some(tempo) => Ok(Some(Sound {
            tempo: parse_number(&tempo, "sound tempo", measure)?,
        })),
        None => Ok(None),
    }
}

/// Merge an `<attributes>` block into `attrs`; later values win
fn parse_attributes(reader: &mut XmlReader, attrs: &mut Attributes, measure: &str) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"divisions" => {
                    attrs.divisions = Some(parse_number(&read_text(reader)?, "divisions", measure)?);
                }
                b"time" => {
                    if let Some(time) = parse_time(reader, measure)? {
                        attrs.time = Some(time);
                    }
                }
                _ => skip_element(reader)?,
            },
            Event::End(ref e) if e.name().as_ref() == b"attributes" => break,
            Event::Eof => return Err(unexpected_eof("attributes")),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

/// `<time>`; `None` when it has no `<beats>` (e.g. `<senza-misura/>`)
fn parse_time(reader: &mut XmlReader, measure: &str) -> Result<Option<TimeSig>> {
    let mut beats = None;
    let mut beat_type = 0;
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"beats" => beats = Some(parse_number(&read_text(reader)?, "beats", measure)?),
                b"beat-type" => beat_type = parse_number(&read_text(reader)?, "beat-type", measure)?,
                _ => skip_element(reader)?,
            },
            Event::End(ref e) if e.name().as_ref() == b"time" => break,
            Event::Eof => return Err(unexpected_eof("time")),
            _ => {}
        }
        buf.clear();
    }
    Ok(beats.map(|beats| TimeSig { beats, beat_type }))
}

fn parse_note(reader: &mut XmlReader, measure: &str) -> Result<Note> {
    let mut note = Note::default();
    let mut tie_types: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"rest" => {
                    note.is_rest = true;
                    skip_element(reader)?;
                }
                b"pitch" => note.pitch = Some(parse_pitch(reader, measure)?),
                b"duration" => {
                    note.duration = parse_number(&read_text(reader)?, "duration", measure)?;
                }
                b"tie" => {
                    tie_types.extend(attribute(e, b"type")?);
                    skip_element(reader)?;
                }
                b"lyric" => {
                    let text = parse_lyric(reader)?;
                    if note.lyric.is_none() {
                        note.lyric = text;
                    }
                }
                _ => skip_element(reader)?,
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"rest" => note.is_rest = true,
                b"tie" => tie_types.extend(attribute(e, b"type")?),
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"note" => break,
            Event::Eof => return Err(unexpected_eof("note")),
            _ => {}
        }
        buf.clear();
    }

    note.tie = Tie::from_types(tie_types.iter().map(String::as_str));
    Ok(note)
}

fn parse_pitch(reader: &mut XmlReader, measure: &str) -> Result<Pitch> {
    let mut step = None;
    let mut alter = 0i8;
    let mut octave = None;
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"step" => {
                    let text = read_text(reader)?;
                    step = Some(
                        Step::from_str(&text)
                            .map_err(|err| MxError::Invalid(format!("measure {}: {}", measure, err)))?,
                    );
                }
                b"alter" => alter = parse_number(&read_text(reader)?, "alter", measure)?,
                b"octave" => octave = Some(parse_number(&read_text(reader)?, "octave", measure)?),
                _ => skip_element(reader)?,
            },
            Event::End(ref e) if e.name().as_ref() == b"pitch" => break,
            Event::Eof => return Err(unexpected_eof("pitch")),
            _ => {}
        }
        buf.clear();
    }

    let step = step.ok_or_else(|| MxError::Invalid(format!("measure {}: pitch missing step", measure)))?;
    let octave =
        octave.ok_or_else(|| MxError::Invalid(format!("measure {}: pitch missing octave", measure)))?;
    Ok(Pitch::new(step, alter, octave))
}

/// First `<text>` of a `<lyric>`
fn parse_lyric(reader: &mut XmlReader) -> Result<Option<String>> {
    let mut text = None;
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(ref e) if e.name().as_ref() == b"text" => {
                let t = read_text(reader)?;
                text.get_or_insert(t);
            }
            Event::Start(_) => skip_element(reader)?,
            Event::End(ref e) if e.name().as_ref() == b"lyric" => break,
            Event::Eof => return Err(unexpected_eof("lyric")),
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

// ============================================================================
// READER HELPERS
// ============================================================================

/// Transcode the document to UTF-8 when it declares another charset
fn decode_document(xml: &[u8]) -> Result<Cow<'_, [u8]>> {
    let (encoding, body) = match Encoding::for_bom(xml) {
        Some((encoding, bom_len)) => (encoding, &xml[bom_len..]),
        None => match declared_encoding(xml) {
            Some(label) => {
                let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                    MxError::Invalid(format!("unknown document encoding {:?}", label))
                })?;
                (encoding, xml)
            }
            None => (UTF_8, xml),
        },
    };

    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(body));
    }
    debug!("decoding document from {}", encoding.name());
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| Cow::Owned(text.into_owned().into_bytes()))
        .ok_or_else(|| MxError::Invalid(format!("document is not valid {}", encoding.name())))
}

/// `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration
fn declared_encoding(xml: &[u8]) -> Option<String> {
    let head = xml.get(..xml.len().min(256))?;
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;
    let rest = &decl[decl.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    Some(value[..value.find(quote)?].to_string())
}

fn next_event<'b>(reader: &mut XmlReader, buf: &'b mut Vec<u8>) -> Result<Event<'b>> {
    reader.read_event_into(buf).map_err(|e| MxError::Xml {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    })
}

/// Text content of the element whose start tag was just read, consuming its end tag
fn read_text(reader: &mut XmlReader) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Text(ref t) => {
                let unescaped = t.unescape().map_err(|e| MxError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                })?;
                text.push_str(&unescaped);
            }
            Event::CData(ref c) => {
                let s = std::str::from_utf8(c)
                    .map_err(|e| MxError::Invalid(format!("CDATA is not UTF-8: {}", e)))?;
                text.push_str(s);
            }
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof("text")),
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}

/// Skip the rest of the element whose start tag was just read
fn skip_element(reader: &mut XmlReader) -> Result<()> {
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match next_event(reader, &mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => break,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(unexpected_eof("element")),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}

fn attribute(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MxError::Invalid(format!("malformed attribute: {}", err)))?;
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|err| MxError::Invalid(format!("malformed attribute value: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_number<T: FromStr>(text: &str, what: &str, measure: &str) -> Result<T> {
    text.trim().parse().map_err(|_| {
        MxError::Invalid(format!("measure {}: invalid {} {:?}", measure, what, text.trim()))
    })
}

fn unexpected_eof(element: &str) -> MxError {
    MxError::Invalid(format!("unexpected end of document inside <{}>", element))
}
