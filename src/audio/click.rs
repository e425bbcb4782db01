//! Click synthesis
//!
//! This module renders the short enveloped sine tone used as a metronome click.
//! Key features:
//! - Pure functions (no side effects, deterministic output)
//! - Accented clicks sound a fifth above the base pitch (1.5x frequency)
//! - Three-segment attack/body/release envelope to avoid pops at buffer edges

use std::f32::consts::PI;

use crate::error::MetronomeError;

/// Pitch multiplier applied to the first beat of a measure
pub const ACCENT_RATIO: f32 = 1.5;

/// Fraction of the click spent ramping up from silence
const ATTACK_FRACTION: f32 = 0.01;

/// Fraction of the click at which the body segment ends
const BODY_END_FRACTION: f32 = 0.1;

/// Envelope level at the end of the body segment
const BODY_END_LEVEL: f32 = 0.2;

/// Rendered mono samples plus the rate they were rendered at.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }
}

/// Parameters for one click.
///
/// Construct through [`ClickSpec::new`], which enforces the synthesis
/// constraints so [`synthesize`] itself cannot fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickSpec {
    frequency_hz: f32,
    duration_sec: f32,
    sample_rate: u32,
    volume: f32,
}

impl ClickSpec {
    /// # Errors
    /// `MetronomeError::InvalidClickSpec` if the frequency or duration is not a
    /// positive finite number, the sample rate is zero, or the volume is outside [0, 1].
    pub fn new(
        frequency_hz: f32,
        duration_sec: f32,
        sample_rate: u32,
        volume: f32,
    ) -> Result<Self, MetronomeError> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(MetronomeError::InvalidClickSpec {
                reason: format!("frequency must be positive (got {})", frequency_hz),
            });
        }
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(MetronomeError::InvalidClickSpec {
                reason: format!("duration must be positive (got {})", duration_sec),
            });
        }
        if sample_rate == 0 {
            return Err(MetronomeError::InvalidClickSpec {
                reason: "sample rate must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(MetronomeError::InvalidClickSpec {
                reason: format!("volume must be within [0, 1] (got {})", volume),
            });
        }

        Ok(Self {
            frequency_hz,
            duration_sec,
            sample_rate,
            volume,
        })
    }

    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    pub fn duration_sec(&self) -> f32 {
        self.duration_sec
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Number of samples a click with these parameters spans.
    pub fn sample_count(&self) -> usize {
        (self.sample_rate as f64 * self.duration_sec as f64).round() as usize
    }
}

/// Tone frequency for a click, raised by [`ACCENT_RATIO`] on accented beats.
#[inline]
pub fn tone_frequency(base_hz: f32, is_accent: bool) -> f32 {
    if is_accent {
        base_hz * ACCENT_RATIO
    } else {
        base_hz
    }
}

/// Renders a click.
///
/// # Examples
/// ```
/// use metronome::audio::click::{synthesize, ClickSpec};
///
/// let spec = ClickSpec::new(880.0, 0.1, 44100, 0.5).unwrap();
/// let click = synthesize(&spec, true);
/// assert_eq!(click.len(), 4410);
/// ```
pub fn synthesize(spec: &ClickSpec, is_accent: bool) -> AudioBuffer {
    let frequency = tone_frequency(spec.frequency_hz, is_accent);
    let sample_rate = spec.sample_rate as f32;
    let phase_step = 2.0 * PI * frequency / sample_rate;

    let samples = envelope(spec.sample_count())
        .into_iter()
        .enumerate()
        .map(|(i, gain)| (phase_step * i as f32).sin() * spec.volume * gain)
        .collect();

    AudioBuffer::new(samples, spec.sample_rate)
}

/// Builds the attack/body/release amplitude envelope for `len` samples.
///
/// Segment boundaries sit at 1% and 10% of the length (rounded down). Each
/// segment is a linear ramp that includes both of its endpoints, so the
/// envelope reaches exactly 1.0 on the last attack sample and exactly 0.0 on
/// the final sample. Segments shorter than two samples hold their start level.
pub fn envelope(len: usize) -> Vec<f32> {
    let attack_end = ((len as f32 * ATTACK_FRACTION) as usize).min(len);
    let body_end = ((len as f32 * BODY_END_FRACTION) as usize).clamp(attack_end, len);

    let mut env = Vec::with_capacity(len);
    push_ramp(&mut env, 0.0, 1.0, attack_end);
    push_ramp(&mut env, 1.0, BODY_END_LEVEL, body_end - attack_end);
    push_ramp(&mut env, BODY_END_LEVEL, 0.0, len - body_end);
    env
}

fn push_ramp(env: &mut Vec<f32>, start: f32, end: f32, count: usize) {
    match count {
        0 => {}
        1 => env.push(start),
        _ => {
            let last = (count - 1) as f32;
            env.extend((0..count).map(|i| start + (end - start) * (i as f32 / last)));
        }
    }
}
