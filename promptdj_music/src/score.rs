// The in-memory score: timestamped note events grouped into named tracks.
//
// Generators build a `Score` from absolute-tick `NoteEvent`s; nothing here is
// delta-encoded or sorted. Ordering and delta encoding happen once, in
// `smf.rs`, when the score is handed to the serializer. A score is a plain
// value owned by whichever call produced it.

use serde::{Deserialize, Serialize};

/// Ticks per quarter note for every generated score.
pub const TICKS_PER_BEAT: u16 = 480;

/// Beats per bar (all generated material is in 4/4).
pub const BEATS_PER_BAR: u32 = 4;

/// Ticks in one 16th note.
pub const TICKS_PER_SIXTEENTH: u32 = TICKS_PER_BEAT as u32 / 4;

/// A single note: onset and length in ticks, MIDI pitch and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    pub onset: u32,
    pub pitch: u8,
    pub velocity: u8,
    /// Always > 0.
    pub duration: u32,
    /// MIDI channel index, 0..=15 (9 is GM percussion).
    pub channel: u8,
}

impl NoteEvent {
    /// Tick of the matching note-off.
    pub fn end(&self) -> u32 {
        self.onset.saturating_add(self.duration)
    }
}

/// A named run of notes that becomes one SMF track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTrack {
    pub name: String,
    pub notes: Vec<NoteEvent>,
}

impl ScoreTrack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: Vec::new(),
        }
    }
}

/// One or more tracks sharing a time base and tempo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub ticks_per_beat: u16,
    pub tempo_bpm: u16,
    pub tracks: Vec<ScoreTrack>,
}

impl Score {
    pub fn new(tempo_bpm: u16) -> Self {
        Self {
            ticks_per_beat: TICKS_PER_BEAT,
            tempo_bpm,
            tracks: Vec::new(),
        }
    }

    /// Ticks spanned by `bars` bars at this score's resolution.
    pub fn bar_ticks(&self, bars: u32) -> u32 {
        bars * BEATS_PER_BAR * self.ticks_per_beat as u32
    }

    /// Microseconds per quarter note, as written to the tempo meta-event.
    pub fn tempo_micros(&self) -> u32 {
        tempo_micros(self.tempo_bpm)
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }

    /// Tick of the last note-off across all tracks.
    pub fn end_tick(&self) -> u32 {
        self.tracks
            .iter()
            .flat_map(|t| t.notes.iter().map(NoteEvent::end))
            .max()
            .unwrap_or(0)
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        let beats = self.end_tick() as f64 / self.ticks_per_beat as f64;
        beats * 60.0 / self.tempo_bpm.max(1) as f64
    }
}

/// Rounded microseconds per beat for a BPM value.
pub fn tempo_micros(bpm: u16) -> u32 {
    let bpm = u32::from(bpm.max(1));
    (60_000_000 + bpm / 2) / bpm
}
