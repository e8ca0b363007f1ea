// Boundary validation for request parameters.
//
// Requests arrive from outside the engine (CLI flags, JSON bodies), so every
// generator entry point runs its parameters through these checks first. Counts
// and tempo outside their legal range are rejected. Fractions (density,
// variation, swing) that are finite but outside [0, 1] are clamped with a
// warning; NaN and infinities are rejected.
//
// Once a request passes, generation cannot fail.

use crate::error::ParamError;
use std::ops::RangeInclusive;

/// Tempo range in BPM. The low end keeps microseconds-per-beat within the
/// 24-bit MIDI tempo field.
pub const TEMPO_RANGE: RangeInclusive<u16> = 4..=960;

pub const MAX_BARS: u32 = 1024;

pub const MAX_OCTAVE_SPAN: u32 = 10;

pub(crate) fn check_tempo(bpm: u16) -> Result<u16, ParamError> {
    if TEMPO_RANGE.contains(&bpm) {
        Ok(bpm)
    } else {
        Err(ParamError::Tempo {
            value: bpm,
            min: *TEMPO_RANGE.start(),
            max: *TEMPO_RANGE.end(),
        })
    }
}

pub(crate) fn check_bars(bars: u32) -> Result<u32, ParamError> {
    if (1..=MAX_BARS).contains(&bars) {
        Ok(bars)
    } else {
        Err(ParamError::Bars {
            value: bars,
            max: MAX_BARS,
        })
    }
}

pub(crate) fn check_octave_span(span: u32) -> Result<u32, ParamError> {
    if (1..=MAX_OCTAVE_SPAN).contains(&span) {
        Ok(span)
    } else {
        Err(ParamError::OctaveSpan {
            value: span,
            max: MAX_OCTAVE_SPAN,
        })
    }
}

/// Reject non-finite values, clamp finite ones into [0, 1].
pub(crate) fn unit_fraction(name: &'static str, value: f64) -> Result<f64, ParamError> {
    if !value.is_finite() {
        return Err(ParamError::NotFinite { name, value });
    }
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        tracing::warn!(parameter = name, value, clamped, "clamping out-of-range fraction");
    }
    Ok(clamped)
}
