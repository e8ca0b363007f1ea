// WAV validation for rendered output.
//
// A renderer that exits cleanly can still leave a truncated or empty file, so
// every waveform is parsed with `hound` before it is handed back.

use crate::error::RenderError;
use serde::Serialize;
use std::io::Cursor;

/// Format summary of a decoded waveform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Sample frames (one sample per channel).
    pub frames: u32,
}

impl WavInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Parse `bytes` as WAV and summarize its format.
pub fn inspect(bytes: &[u8]) -> Result<WavInfo, RenderError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

#[cfg(test)]
pub(crate) fn sine_wav(sample_rate: u32, frames: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let t = i as f32 / sample_rate as f32;
            let s = ((t * 440.0 * std::f32::consts::TAU).sin() * 8000.0) as i16;
            writer.write_sample(s).unwrap();
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
