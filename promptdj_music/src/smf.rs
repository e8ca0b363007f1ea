// Standard MIDI File encoding and decoding.
//
// `score_to_smf` turns a `Score` into an SMF held in memory: format 0 for a
// single track, format 1 (parallel) otherwise, metrical timing at the score's
// ticks per beat. The first track carries the tempo and a 4/4 time signature;
// every track carries its name, its note events, and an end-of-track marker.
//
// Event ordering: each note contributes a note-on at its onset and a note-off
// at its end, appended in onset order; the combined list is then stably sorted
// by absolute tick. So at a shared tick, events keep insertion order (a note
// ending at tick T is released before the note starting at T), and delta
// times are never negative.
//
// The decoding side hands the continuation and humanizer passes a parsed
// `Smf` (they work on delta-encoded events directly), and `read_notes` pairs
// note-on/note-off messages back into absolute `NoteEvent`s for inspection.
//
// Uses the `midly` crate for parsing and writing.

use crate::error::ScoreError;
use crate::score::{NoteEvent, Score, ScoreTrack};
use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;

/// Largest delta a variable-length quantity can encode.
pub const MAX_DELTA: u32 = (1 << 28) - 1;

/// Delta for `ticks`, saturating at `MAX_DELTA` instead of wrapping.
pub(crate) fn clamp_delta(ticks: u32) -> u28 {
    u28::new(ticks.min(MAX_DELTA))
}

/// A note-on or note-off, with note-on at velocity 0 folded into `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMessage {
    On { channel: u8, key: u8, vel: u8 },
    Off { channel: u8, key: u8 },
}

impl NoteMessage {
    /// Classify a track event; `None` for anything that is not a note message.
    pub fn classify(kind: &TrackEventKind<'_>) -> Option<Self> {
        let TrackEventKind::Midi { channel, message } = kind else {
            return None;
        };
        let channel = channel.as_int();
        match *message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => Some(NoteMessage::On {
                channel,
                key: key.as_int(),
                vel: vel.as_int(),
            }),
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                Some(NoteMessage::Off {
                    channel,
                    key: key.as_int(),
                })
            }
            _ => None,
        }
    }

    /// Build the equivalent `midly` event kind. Offs are written as real
    /// note-off messages with velocity 0.
    pub fn to_kind<'a>(self) -> TrackEventKind<'a> {
        match self {
            NoteMessage::On { channel, key, vel } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: MidiMessage::NoteOn {
                    key: u7::new(key),
                    vel: u7::new(vel),
                },
            },
            NoteMessage::Off { channel, key } => TrackEventKind::Midi {
                channel: u4::new(channel),
                message: MidiMessage::NoteOff {
                    key: u7::new(key),
                    vel: u7::new(0),
                },
            },
        }
    }
}

/// Convert a score to an in-memory SMF. Track names borrow from `score`.
pub fn score_to_smf(score: &Score) -> Smf<'_> {
    let format = if score.tracks.len() > 1 {
        Format::Parallel
    } else {
        Format::SingleTrack
    };
    let mut smf = Smf::new(Header::new(
        format,
        Timing::Metrical(u15::new(score.ticks_per_beat)),
    ));

    if score.tracks.is_empty() {
        // Still emit a conductor track so the file carries tempo and meter.
        let mut track = conductor_events(score);
        track.push(end_of_track(0));
        smf.tracks.push(track);
        return smf;
    }

    for (i, track) in score.tracks.iter().enumerate() {
        smf.tracks.push(encode_track(score, track, i == 0));
    }
    smf
}

/// Encode a score as SMF bytes.
pub fn encode(score: &Score) -> Result<Vec<u8>, ScoreError> {
    encode_smf(&score_to_smf(score))
}

/// Encode an already-built SMF as bytes.
pub fn encode_smf(smf: &Smf<'_>) -> Result<Vec<u8>, ScoreError> {
    let mut buf = Vec::new();
    smf.write_std(&mut buf).map_err(ScoreError::Encode)?;
    Ok(buf)
}

/// Encode a score and write it to `path`.
pub fn write_score(score: &Score, path: &Path) -> Result<(), ScoreError> {
    let bytes = encode(score)?;
    std::fs::write(path, &bytes).map_err(|source| ScoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote score");
    Ok(())
}

/// Parse SMF bytes. Rejects files that are malformed or hold no tracks.
pub fn decode(bytes: &[u8]) -> Result<Smf<'_>, ScoreError> {
    let smf = Smf::parse(bytes)?;
    if smf.tracks.is_empty() {
        return Err(ScoreError::NoTracks);
    }
    Ok(smf)
}

/// Pair note-ons with their note-offs and return absolute notes in onset order.
///
/// Pairing is first-in first-out per (channel, key). Note-ons that are never
/// released, and zero-length notes, are dropped. Ticks past `u32::MAX`
/// saturate.
pub fn read_notes(track: &[TrackEvent<'_>]) -> Vec<NoteEvent> {
    let mut notes: Vec<NoteEvent> = Vec::new();
    let mut open: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();
    let mut tick: u32 = 0;

    for event in track {
        tick = tick.saturating_add(event.delta.as_int());
        match NoteMessage::classify(&event.kind) {
            Some(NoteMessage::On { channel, key, vel }) => {
                open.entry((channel, key)).or_default().push_back(notes.len());
                notes.push(NoteEvent {
                    onset: tick,
                    pitch: key,
                    velocity: vel,
                    duration: 0,
                    channel,
                });
            }
            Some(NoteMessage::Off { channel, key }) => {
                if let Some(idx) = open.get_mut(&(channel, key)).and_then(VecDeque::pop_front) {
                    notes[idx].duration = tick - notes[idx].onset;
                }
            }
            None => {}
        }
    }

    let unreleased: Vec<usize> = open.into_values().flatten().collect();
    notes
        .into_iter()
        .enumerate()
        .filter(|(i, n)| n.duration > 0 && !unreleased.contains(i))
        .map(|(_, n)| n)
        .collect()
}

/// Track name of a parsed track, if it has one.
pub fn track_name(track: &[TrackEvent<'_>]) -> Option<String> {
    track.iter().find_map(|e| match e.kind {
        TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
            Some(String::from_utf8_lossy(name).into_owned())
        }
        _ => None,
    })
}

fn conductor_events(score: &Score) -> Track<'static> {
    vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(score.tempo_micros()))),
        },
        TrackEvent {
            delta: u28::new(0),
            // 4/4: numerator, log2(denominator), MIDI clocks per click, 32nds per quarter.
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
    ]
}

fn end_of_track<'a>(delta: u32) -> TrackEvent<'a> {
    TrackEvent {
        delta: u28::new(delta),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}

fn encode_track<'a>(score: &Score, track: &'a ScoreTrack, conductor: bool) -> Track<'a> {
    let mut events: Track<'a> = if conductor {
        conductor_events(score)
    } else {
        Vec::new()
    };
    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
    });

    let mut notes = track.notes.clone();
    notes.sort_by_key(|n| n.onset);

    let mut timed: Vec<(u32, NoteMessage)> = Vec::with_capacity(notes.len() * 2);
    for n in &notes {
        timed.push((
            n.onset,
            NoteMessage::On {
                channel: n.channel,
                key: n.pitch,
                vel: n.velocity,
            },
        ));
        timed.push((
            n.end(),
            NoteMessage::Off {
                channel: n.channel,
                key: n.pitch,
            },
        ));
    }
    timed.sort_by_key(|&(tick, _)| tick);

    let mut last_tick = 0;
    for (tick, message) in timed {
        events.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: message.to_kind(),
        });
        last_tick = tick;
    }

    events.push(end_of_track(0));
    events
}
