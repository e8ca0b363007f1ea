// Scale table and pitch resolution.
//
// A scale is a root pitch class plus the interval offsets (semitones above the
// root) that belong to it. The table is static and ordered; `lookup` returns
// `None` for identifiers it does not know and callers choose the fallback
// (normally `default_scale()`), so the fallback is visible at the call site.
//
// `resolve_pitches` turns a scale into the ascending list of absolute MIDI
// pitches the melody walk moves over. Octave arithmetic is `octave * 12 +
// root + interval`, so "octave 4" of C is pitch 48.

use serde::Serialize;

/// Identifier of the scale used when a request names an unknown one.
pub const DEFAULT_SCALE: &str = "C_major";

/// Highest legal MIDI pitch.
pub const MAX_PITCH: i32 = 127;

const MAJOR: &[u8] = &[0, 2, 4, 5, 7, 9, 11];
const NATURAL_MINOR: &[u8] = &[0, 2, 3, 5, 7, 8, 10];
/// Minor with a raised sixth; used for D minor.
const DORIAN: &[u8] = &[0, 2, 3, 5, 7, 9, 10];

/// A named scale: root pitch class and in-scale interval offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scale {
    pub name: &'static str,
    /// Pitch class of the root (0 = C ... 11 = B).
    pub root: u8,
    /// Ascending semitone offsets from the root. Always starts at 0.
    pub intervals: &'static [u8],
}

const fn entry(name: &'static str, root: u8, intervals: &'static [u8]) -> Scale {
    Scale {
        name,
        root,
        intervals,
    }
}

static SCALES: [Scale; 10] = [
    entry("C_major", 0, MAJOR),
    entry("C_minor", 0, NATURAL_MINOR),
    entry("D_major", 2, MAJOR),
    entry("D_minor", 2, DORIAN),
    entry("E_minor", 4, NATURAL_MINOR),
    entry("F_major", 5, MAJOR),
    entry("G_major", 7, MAJOR),
    entry("A_minor", 9, NATURAL_MINOR),
    entry("A_major", 9, MAJOR),
    entry("B_minor", 11, NATURAL_MINOR),
];

impl Scale {
    /// Intervals are unique, below 12, and include 0; root is a pitch class.
    pub fn is_well_formed(&self) -> bool {
        let mut seen = [false; 12];
        for &iv in self.intervals {
            if iv >= 12 || seen[iv as usize] {
                return false;
            }
            seen[iv as usize] = true;
        }
        self.root < 12 && seen[0]
    }

    /// Whether a MIDI pitch belongs to this scale.
    pub fn contains(&self, pitch: u8) -> bool {
        let pc = (pitch % 12 + 12 - self.root) % 12;
        self.intervals.contains(&pc)
    }
}

/// Look up a scale by identifier (case-sensitive, e.g. `"A_minor"`).
pub fn lookup(name: &str) -> Option<&'static Scale> {
    SCALES.iter().find(|s| s.name == name)
}

/// The fallback scale, C major.
pub fn default_scale() -> &'static Scale {
    &SCALES[0]
}

/// All known scale identifiers in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    SCALES.iter().map(|s| s.name)
}

/// Ascending absolute pitches of `scale` across `span` octaves centered on
/// `center_octave`, dropping anything outside 0..=127.
///
/// The first octave is `center_octave - span / 2`, so a span of 1 covers
/// exactly the center octave and a span of 3 covers one octave either side.
pub fn resolve_pitches(scale: &Scale, center_octave: i32, span: u32) -> Vec<u8> {
    let first = center_octave - (span / 2) as i32;
    let mut pitches = Vec::with_capacity(span as usize * scale.intervals.len());
    for octave in first..first + span as i32 {
        for &iv in scale.intervals {
            let pitch = octave * 12 + scale.root as i32 + iv as i32;
            if (0..=MAX_PITCH).contains(&pitch) {
                pitches.push(pitch as u8);
            }
        }
    }
    pitches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_well_formed() {
        for scale in &SCALES {
            assert!(scale.is_well_formed(), "{} is malformed", scale.name);
        }
    }

    #[test]
    fn lookup_known_and_unknown() {
        assert_eq!(lookup("A_minor").map(|s| s.root), Some(9));
        assert!(lookup("H_lydian").is_none());
        assert!(lookup("c_major").is_none());
        assert_eq!(default_scale().name, DEFAULT_SCALE);
    }

    #[test]
    fn names_in_table_order() {
        let names: Vec<_> = names().collect();
        assert_eq!(names.len(), 10);
        assert_eq!(names[0], "C_major");
        assert_eq!(names[9], "B_minor");
    }

    #[test]
    fn single_octave_c_major() {
        let pitches = resolve_pitches(default_scale(), 4, 1);
        assert_eq!(pitches, vec![48, 50, 52, 53, 55, 57, 59]);
    }

    #[test]
    fn span_is_centered_and_ascending() {
        let a_minor = lookup("A_minor").unwrap();
        let pitches = resolve_pitches(a_minor, 4, 3);
        assert_eq!(pitches.len(), 21);
        // Octave 3 root A = 3*12 + 9.
        assert_eq!(pitches[0], 45);
        assert!(pitches.windows(2).all(|w| w[0] < w[1]));
        assert!(pitches.iter().all(|&p| a_minor.contains(p)));
    }

    #[test]
    fn out_of_range_pitches_are_dropped() {
        let b_minor = lookup("B_minor").unwrap();
        // Octave 10 of B starts at 131, so nothing fits.
        assert!(resolve_pitches(b_minor, 10, 1).is_empty());
        // Octave -1 would be negative for most degrees.
        let low = resolve_pitches(default_scale(), 0, 2);
        assert_eq!(low.first(), Some(&0));
        assert!(low.iter().all(|&p| p < 12));
    }

    #[test]
    fn well_formed_rejects_bad_intervals() {
        let dup = entry("dup", 0, &[0, 2, 2]);
        let no_root = entry("no_root", 0, &[2, 4]);
        let wide = entry("wide", 0, &[0, 12]);
        assert!(!dup.is_well_formed());
        assert!(!no_root.is_well_formed());
        assert!(!wide.is_well_formed());
    }
}
