// General-MIDI drum kit and rhythmic template library.
//
// Each `DrumVoice` maps to a fixed GM percussion key (played on channel 10,
// index 9). A `DrumTemplate` is an ordered list of lanes, one per voice, each
// a run of 0/1 step activations where one step is a 16th note of a 4/4 bar.
// Lane order matters: within a step, hits are drawn in lane order, which fixes
// the order of random draws and of simultaneous events in the output.
//
// Lanes are normally 16 steps. A shorter lane repeats: the sequencer indexes
// it with `step % lane.len()`.
//
// `lookup_template` returns `None` for unknown styles; the sequencer applies
// the `basic` fallback itself.

use serde::{Deserialize, Serialize};

/// Steps per bar (16th-note grid in 4/4).
pub const STEPS_PER_BAR: usize = 16;

/// Style used when a request names an unknown one.
pub const DEFAULT_STYLE: &str = "basic";

/// A percussion voice of the GM drum map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumVoice {
    Kick,
    Snare,
    Clap,
    HihatClosed,
    HihatOpen,
    TomLow,
    TomMid,
    TomHigh,
    Crash,
    Ride,
}

impl DrumVoice {
    pub const ALL: [DrumVoice; 10] = [
        DrumVoice::Kick,
        DrumVoice::Snare,
        DrumVoice::Clap,
        DrumVoice::HihatClosed,
        DrumVoice::HihatOpen,
        DrumVoice::TomLow,
        DrumVoice::TomMid,
        DrumVoice::TomHigh,
        DrumVoice::Crash,
        DrumVoice::Ride,
    ];

    /// GM percussion key for this voice.
    pub fn pitch(self) -> u8 {
        match self {
            DrumVoice::Kick => 36,
            DrumVoice::Snare => 38,
            DrumVoice::Clap => 39,
            DrumVoice::HihatClosed => 42,
            DrumVoice::TomLow => 45,
            DrumVoice::HihatOpen => 46,
            DrumVoice::TomMid => 47,
            DrumVoice::Crash => 49,
            DrumVoice::TomHigh => 50,
            DrumVoice::Ride => 51,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrumVoice::Kick => "kick",
            DrumVoice::Snare => "snare",
            DrumVoice::Clap => "clap",
            DrumVoice::HihatClosed => "hihat_closed",
            DrumVoice::HihatOpen => "hihat_open",
            DrumVoice::TomLow => "tom_low",
            DrumVoice::TomMid => "tom_mid",
            DrumVoice::TomHigh => "tom_high",
            DrumVoice::Crash => "crash",
            DrumVoice::Ride => "ride",
        }
    }

    /// Inverse of [`DrumVoice::pitch`].
    pub fn from_pitch(pitch: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.pitch() == pitch)
    }
}

/// One voice's activation pattern inside a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumLane {
    pub voice: DrumVoice,
    pub steps: &'static [u8],
}

impl DrumLane {
    /// Whether the lane fires on `step`, wrapping shorter lanes.
    pub fn is_active(&self, step: usize) -> bool {
        !self.steps.is_empty() && self.steps[step % self.steps.len()] != 0
    }
}

/// A named rhythmic template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrumTemplate {
    pub name: &'static str,
    pub lanes: &'static [DrumLane],
}

const fn lane(voice: DrumVoice, steps: &'static [u8]) -> DrumLane {
    DrumLane { voice, steps }
}

use DrumVoice::*;

static TEMPLATES: [DrumTemplate; 12] = [
    DrumTemplate {
        name: "basic",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
        ],
    },
    DrumTemplate {
        name: "funk",
        lanes: &[
            lane(Kick, &[1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
            lane(HihatOpen, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0]),
        ],
    },
    DrumTemplate {
        name: "jazz",
        lanes: &[
            lane(Ride, &[1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 1, 0]),
            lane(Kick, &[1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0]),
            lane(HihatClosed, &[0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0]),
        ],
    },
    DrumTemplate {
        name: "electronic",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
            lane(Clap, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
        ],
    },
    DrumTemplate {
        name: "techno",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            lane(Clap, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
            lane(HihatOpen, &[0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1]),
            lane(TomLow, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0]),
        ],
    },
    DrumTemplate {
        name: "dnb",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0]),
            lane(HihatClosed, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
        ],
    },
    DrumTemplate {
        name: "hiphop",
        lanes: &[
            lane(Kick, &[1, 0, 0, 1, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
            lane(HihatOpen, &[0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1]),
        ],
    },
    DrumTemplate {
        name: "house",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            lane(Clap, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0]),
            lane(HihatOpen, &[0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0]),
        ],
    },
    DrumTemplate {
        name: "trap",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(HihatClosed, &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1]),
            lane(HihatOpen, &[0, 0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0]),
        ],
    },
    DrumTemplate {
        name: "reggae",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
        ],
    },
    // Bossa-nova flavoured.
    DrumTemplate {
        name: "latin",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
            lane(TomHigh, &[0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0]),
        ],
    },
    DrumTemplate {
        name: "dubstep",
        lanes: &[
            lane(Kick, &[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0]),
            lane(Snare, &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]),
            lane(HihatClosed, &[1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0]),
            lane(TomLow, &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]),
        ],
    },
];

/// Look up a template by style name (e.g. `"funk"`).
pub fn lookup_template(style: &str) -> Option<&'static DrumTemplate> {
    TEMPLATES.iter().find(|t| t.name == style)
}

/// The `basic` rock template.
pub fn default_template() -> &'static DrumTemplate {
    &TEMPLATES[0]
}

/// All known style names in table order.
pub fn style_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.iter().map(|t| t.name)
}
