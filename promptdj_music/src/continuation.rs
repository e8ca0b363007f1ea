// Continuation: extend a score by replaying a varied copy of its tail.
//
// Works track by track on a decoded SMF, on delta-encoded events, with no
// state shared between tracks. For each track:
//
// - Note messages are note-on/note-off (a velocity-0 note-on counts as off).
//   A track with `min_note_messages` or fewer of them is copied unchanged.
// - Otherwise the whole track is copied verbatim except its end-of-track
//   marker, then the tail (the last `tail_fraction` of note messages, by
//   count) is appended again with every note-on varied: pitch moves by a
//   weighted offset and velocity by a uniform jitter, both clamped.
// - Each appended note-off follows the pitch chosen for its note-on. A tail
//   note-off whose note-on came before the tail has nothing to release in the
//   copy and is dropped; its delta carries forward, as do the deltas of any
//   non-note events skipped inside the tail, so the replay keeps its timing.
//   A carried gap longer than one delta can encode saturates at `MAX_DELTA`.
// - A fresh end-of-track closes the track.

use crate::config::ContinuationTuning;
use crate::error::{ConfigError, ScoreError};
use crate::sampler::WeightedTable;
use crate::smf::{self, NoteMessage, clamp_delta};
use midly::num::u7;
use midly::{MetaMessage, MidiMessage, Smf, Track, TrackEvent, TrackEventKind};
use promptdj_prng::SeqRng;
use std::collections::{HashMap, VecDeque};

/// Continuation pass with validated tunables.
#[derive(Clone, Debug)]
pub struct Continuation {
    min_note_messages: usize,
    tail_fraction: f64,
    pitch_offsets: WeightedTable<i32>,
    velocity_jitter: i64,
}

impl Continuation {
    pub fn new(tuning: &ContinuationTuning) -> Result<Self, ConfigError> {
        if !(tuning.tail_fraction > 0.0 && tuning.tail_fraction <= 1.0) {
            return Err(ConfigError::invalid(
                "continuation.tail_fraction",
                format!("{} is outside (0, 1]", tuning.tail_fraction),
            ));
        }
        let pitch_offsets = WeightedTable::new(&tuning.pitch_offsets, &tuning.pitch_offset_weights)
            .map_err(|e| ConfigError::invalid("continuation.pitch_offsets", e.to_string()))?;
        Ok(Self {
            min_note_messages: tuning.min_note_messages,
            tail_fraction: tuning.tail_fraction,
            pitch_offsets,
            velocity_jitter: tuning.velocity_jitter.into(),
        })
    }

    /// Decode `input`, continue every track, and encode the result.
    pub fn apply_bytes(&self, input: &[u8], seed: Option<u64>) -> Result<Vec<u8>, ScoreError> {
        let smf = smf::decode(input)?;
        let mut rng = SeqRng::from_seed(seed);
        smf::encode_smf(&self.apply(&smf, &mut rng))
    }

    /// Continue every track of a parsed file. Header and track count are kept.
    pub fn apply<'a>(&self, input: &Smf<'a>, rng: &mut SeqRng) -> Smf<'a> {
        let mut out = Smf::new(input.header);
        for track in &input.tracks {
            out.tracks.push(self.continue_track(track, rng));
        }
        out
    }

    /// Index of the first tail note message.
    fn tail_start(&self, note_messages: usize) -> usize {
        (note_messages as f64 * (1.0 - self.tail_fraction)).floor() as usize
    }

    fn continue_track<'a>(&self, track: &[TrackEvent<'a>], rng: &mut SeqRng) -> Track<'a> {
        let note_positions: Vec<usize> = track
            .iter()
            .enumerate()
            .filter(|(_, e)| NoteMessage::classify(&e.kind).is_some())
            .map(|(i, _)| i)
            .collect();

        if note_positions.len() <= self.min_note_messages {
            return track.to_vec();
        }

        let mut out: Track<'a> = Vec::with_capacity(track.len() * 2);
        // Delta owed to the next appended event.
        let mut carry: u32 = 0;
        for event in track {
            if is_end_of_track(&event.kind) {
                carry = carry.saturating_add(event.delta.as_int());
            } else {
                out.push(*event);
            }
        }

        let first_tail = note_positions[self.tail_start(note_positions.len())];
        let mut released: HashMap<(u8, u8), VecDeque<u8>> = HashMap::new();
        let mut varied = 0usize;

        for event in &track[first_tail..] {
            let delta = carry.saturating_add(event.delta.as_int());
            match NoteMessage::classify(&event.kind) {
                Some(NoteMessage::On { channel, key, vel }) => {
                    let offset = self.pitch_offsets.sample(rng);
                    let new_key = (i32::from(key) + offset).clamp(0, 127) as u8;
                    let jitter =
                        rng.range_i64_inclusive(-self.velocity_jitter, self.velocity_jitter);
                    let new_vel = (i64::from(vel) + jitter).clamp(1, 127) as u8;
                    released.entry((channel, key)).or_default().push_back(new_key);
                    out.push(TrackEvent {
                        delta: clamp_delta(delta),
                        kind: NoteMessage::On {
                            channel,
                            key: new_key,
                            vel: new_vel,
                        }
                        .to_kind(),
                    });
                    carry = 0;
                    varied += 1;
                }
                Some(NoteMessage::Off { channel, key }) => {
                    match released.get_mut(&(channel, key)).and_then(VecDeque::pop_front) {
                        Some(new_key) => {
                            let mut kind = event.kind;
                            retarget_key(&mut kind, new_key);
                            out.push(TrackEvent {
                                delta: clamp_delta(delta),
                                kind,
                            });
                            carry = 0;
                        }
                        None => carry = delta,
                    }
                }
                None => carry = delta,
            }
        }

        out.push(TrackEvent {
            delta: clamp_delta(carry),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        tracing::debug!(
            note_messages = note_positions.len(),
            varied,
            "continued track"
        );
        out
    }
}

fn is_end_of_track(kind: &TrackEventKind<'_>) -> bool {
    matches!(kind, TrackEventKind::Meta(MetaMessage::EndOfTrack))
}

/// Point a note-off (or velocity-0 note-on) at a different key, keeping the
/// message type and release velocity.
fn retarget_key(kind: &mut TrackEventKind<'_>, new_key: u8) {
    if let TrackEventKind::Midi { message, .. } = kind {
        match message {
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                *key = u7::new(new_key);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{NoteEvent, Score, ScoreTrack};

    fn continuation() -> Continuation {
        Continuation::new(&ContinuationTuning::default()).unwrap()
    }

    /// A legato line of `n` quarter notes.
    fn line(n: u32) -> Score {
        let mut score = Score::new(120);
        let mut track = ScoreTrack::new("line");
        for i in 0..n {
            track.notes.push(NoteEvent {
                onset: i * 480,
                pitch: 60 + (i % 12) as u8,
                velocity: 80,
                duration: 480,
                channel: 0,
            });
        }
        score.tracks.push(track);
        score
    }

    fn note_messages(track: &[TrackEvent<'_>]) -> Vec<NoteMessage> {
        track
            .iter()
            .filter_map(|e| NoteMessage::classify(&e.kind))
            .collect()
    }

    #[test]
    fn short_tracks_are_copied_unchanged() {
        let score = line(10); // 20 note messages
        let bytes = smf::encode(&score).unwrap();
        let input = smf::decode(&bytes).unwrap();
        let out = continuation().apply(&input, &mut SeqRng::new(1));
        assert_eq!(out.tracks, input.tracks);
    }

    #[test]
    fn head_is_preserved_and_tail_is_appended() {
        let score = line(16); // 32 note messages, tail = last 8
        let bytes = smf::encode(&score).unwrap();
        let input = smf::decode(&bytes).unwrap();
        let out = continuation().apply(&input, &mut SeqRng::new(7));

        let original = &input.tracks[0];
        let extended = &out.tracks[0];
        // Everything but the original end-of-track survives verbatim.
        assert_eq!(&extended[..original.len() - 1], &original[..original.len() - 1]);
        assert!(is_end_of_track(&extended[extended.len() - 1].kind));

        // floor(32 * 0.75) = 24 is the attack of note 12: notes 12..16 replay.
        assert_eq!(note_messages(original).len(), 32);
        assert_eq!(note_messages(extended).len(), 40);
    }

    #[test]
    fn orphan_release_is_dropped_and_its_delta_carried() {
        let score = line(13); // 26 note messages
        let bytes = smf::encode(&score).unwrap();
        let input = smf::decode(&bytes).unwrap();
        let out = continuation().apply(&input, &mut SeqRng::new(2));
        // floor(26 * 0.75) = 19 is the release of note 9, whose attack is
        // outside the tail.
        let notes = smf::read_notes(&out.tracks[0]);
        assert_eq!(note_messages(&out.tracks[0]).len(), 26 + 6);
        assert_eq!(notes.len(), 16);
        // The replay of note 10 keeps the gap the dropped release stood for.
        assert_eq!(notes[13].onset, 13 * 480 + 480);
        assert_eq!(notes[15].end(), 13 * 480 + 4 * 480);
    }

    #[test]
    fn appended_region_is_balanced_and_bounded() {
        let score = line(40);
        let bytes = smf::encode(&score).unwrap();
        let input = smf::decode(&bytes).unwrap();
        for seed in 0..20 {
            let out = continuation().apply(&input, &mut SeqRng::new(seed));
            let extended = &out.tracks[0];
            let appended = &extended[input.tracks[0].len() - 1..];
            let mut open: HashMap<(u8, u8), i32> = HashMap::new();
            for m in note_messages(appended) {
                match m {
                    NoteMessage::On { channel, key, vel } => {
                        assert!((1..=127).contains(&vel));
                        *open.entry((channel, key)).or_default() += 1;
                    }
                    NoteMessage::Off { channel, key } => {
                        let count = open.entry((channel, key)).or_default();
                        *count -= 1;
                        assert!(*count >= 0, "release without attack for key {key}");
                    }
                }
            }
            assert!(open.values().all(|&c| c == 0));
            // Every note of the replay is still a sounding, paired note.
            let notes = smf::read_notes(extended);
            assert_eq!(notes.len(), 40 + 10);
        }
    }

    #[test]
    fn pitch_moves_at_most_two_semitones() {
        let score = line(24);
        let bytes = smf::encode(&score).unwrap();
        let input = smf::decode(&bytes).unwrap();
        let out = continuation().apply(&input, &mut SeqRng::new(3));
        let notes = smf::read_notes(&out.tracks[0]);
        let originals = smf::read_notes(&input.tracks[0]);
        let replay = &notes[originals.len()..];
        let source = &originals[originals.len() - replay.len()..];
        for (new, old) in replay.iter().zip(source) {
            assert!((i32::from(new.pitch) - i32::from(old.pitch)).abs() <= 2);
            assert!((i32::from(new.velocity) - i32::from(old.velocity)).abs() <= 10);
            assert_eq!(new.duration, old.duration);
        }
    }

    #[test]
    fn same_seed_same_continuation() {
        let bytes = smf::encode(&line(30)).unwrap();
        let c = continuation();
        assert_eq!(
            c.apply_bytes(&bytes, Some(99)).unwrap(),
            c.apply_bytes(&bytes, Some(99)).unwrap()
        );
    }

    #[test]
    fn tracks_are_continued_independently() {
        let mut score = line(30);
        let mut second = score.tracks[0].clone();
        second.name = "copy".into();
        for n in &mut second.notes {
            n.channel = 1;
        }
        score.tracks.push(second);
        let bytes = smf::encode(&score).unwrap();
        let out = continuation().apply_bytes(&bytes, Some(5)).unwrap();
        let out = smf::decode(&out).unwrap();
        assert_eq!(out.tracks.len(), 2);
        assert_eq!(smf::track_name(&out.tracks[1]).as_deref(), Some("copy"));
        for track in &out.tracks {
            assert!(smf::read_notes(track).len() > 30);
        }
    }

    #[test]
    fn pitches_clamp_at_the_top() {
        let mut score = line(30);
        for n in &mut score.tracks[0].notes {
            n.pitch = 127;
        }
        let bytes = smf::encode(&score).unwrap();
        let out = smf::decode(&continuation().apply_bytes(&bytes, Some(1)).unwrap())
            .map(|s| smf::read_notes(&s.tracks[0]))
            .unwrap();
        assert!(out.iter().all(|n| n.pitch >= 125));
    }

    #[test]
    fn long_skipped_gaps_saturate_instead_of_wrapping() {
        use midly::num::u28;
        let bytes = smf::encode(&line(16)).unwrap();
        let mut input = smf::decode(&bytes).unwrap();
        // Three meta events, then note messages; message 26 is the attack of
        // note 13, inside the tail.
        let at = 3 + 26;
        for (i, delta) in [0x0FFF_FF00, 0x0FFF_FF00].into_iter().enumerate() {
            input.tracks[0].insert(
                at + i,
                TrackEvent {
                    delta: u28::new(delta),
                    kind: TrackEventKind::Meta(MetaMessage::Text(b"gap")),
                },
            );
        }
        let head = input.tracks[0].len() - 1;
        let out = continuation().apply(&input, &mut SeqRng::new(6));
        let appended = &out.tracks[0][head..];
        assert!(matches!(
            NoteMessage::classify(&appended[2].kind),
            Some(NoteMessage::On { .. })
        ));
        assert_eq!(appended[2].delta.as_int(), smf::MAX_DELTA);

        // Enough skipped gaps to overflow a u32 still come out clamped.
        for _ in 0..20 {
            input.tracks[0].insert(
                at,
                TrackEvent {
                    delta: u28::new(smf::MAX_DELTA),
                    kind: TrackEventKind::Meta(MetaMessage::Text(b"gap")),
                },
            );
        }
        let head = input.tracks[0].len() - 1;
        let out = continuation().apply(&input, &mut SeqRng::new(6));
        assert_eq!(out.tracks[0][head + 2].delta.as_int(), smf::MAX_DELTA);
        assert!(smf::encode_smf(&out).is_ok());
    }

    #[test]
    fn invalid_input_is_an_error() {
        assert!(continuation().apply_bytes(b"MThd garbage", None).is_err());
    }

    #[test]
    fn invalid_tuning_is_rejected() {
        let bad = ContinuationTuning {
            tail_fraction: 0.0,
            ..ContinuationTuning::default()
        };
        assert!(Continuation::new(&bad).is_err());
        let bad = ContinuationTuning {
            pitch_offset_weights: vec![],
            ..ContinuationTuning::default()
        };
        assert!(Continuation::new(&bad).is_err());
    }
}
