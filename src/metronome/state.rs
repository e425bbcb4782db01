//! Metronome session state and the ranges it is held to.

use crate::config::MetronomeConfig;

/// Slowest supported tempo
pub const MIN_TEMPO_BPM: u32 = 40;

/// Fastest supported tempo
pub const MAX_TEMPO_BPM: u32 = 208;

/// Measure lengths offered to the user
pub const SUPPORTED_BEATS_PER_MEASURE: [u32; 5] = [2, 3, 4, 6, 8];

pub const DEFAULT_TEMPO_BPM: u32 = 120;
pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Whether `beats` is one of [`SUPPORTED_BEATS_PER_MEASURE`].
pub fn is_supported_beats_per_measure(beats: u32) -> bool {
    SUPPORTED_BEATS_PER_MEASURE.contains(&beats)
}

/// Milliseconds between ticks: `round(60000 / bpm)`.
///
/// # Examples
/// ```
/// use metronome::metronome::state::interval_ms;
///
/// assert_eq!(interval_ms(120), 500);
/// assert_eq!(interval_ms(208), 288);
/// ```
#[inline]
pub fn interval_ms(tempo_bpm: u32) -> u64 {
    let bpm = tempo_bpm.max(1) as u64;
    (60_000 + bpm / 2) / bpm
}

pub fn clamp_tempo(bpm: u32) -> u32 {
    bpm.clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM)
}

/// Nearest supported measure length; ties resolve to the shorter measure.
pub fn snap_beats_per_measure(beats: u32) -> u32 {
    SUPPORTED_BEATS_PER_MEASURE
        .iter()
        .copied()
        .min_by_key(|&supported| supported.abs_diff(beats))
        .unwrap_or(DEFAULT_BEATS_PER_MEASURE)
}

/// Clamps to [0, 1]; NaN is treated as silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Everything the session knows about the running metronome.
///
/// Setters clamp rather than fail, so tempo, measure length and volume are
/// always within range. `current_beat` is 0 until the first tick after a
/// start, then cycles through `1..=beats_per_measure`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetronomeState {
    tempo_bpm: u32,
    beats_per_measure: u32,
    volume: f32,
    current_beat: u32,
    is_playing: bool,
}

impl Default for MetronomeState {
    fn default() -> Self {
        Self {
            tempo_bpm: DEFAULT_TEMPO_BPM,
            beats_per_measure: DEFAULT_BEATS_PER_MEASURE,
            volume: DEFAULT_VOLUME,
            current_beat: 0,
            is_playing: false,
        }
    }
}

impl MetronomeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial state from configuration, clamped like setter input.
    pub fn from_config(config: &MetronomeConfig) -> Self {
        let mut state = Self::default();
        state.set_tempo(config.tempo_bpm);
        state.set_beats_per_measure(config.beats_per_measure);
        state.set_volume(config.volume);
        state
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.tempo_bpm
    }

    pub fn beats_per_measure(&self) -> u32 {
        self.beats_per_measure
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_beat(&self) -> u32 {
        self.current_beat
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Tick interval for the current tempo.
    pub fn interval_ms(&self) -> u64 {
        interval_ms(self.tempo_bpm)
    }

    /// Returns the tempo actually applied.
    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        self.tempo_bpm = clamp_tempo(bpm);
        self.tempo_bpm
    }

    /// Returns the measure length actually applied. The current beat is kept.
    pub fn set_beats_per_measure(&mut self, beats: u32) -> u32 {
        self.beats_per_measure = snap_beats_per_measure(beats);
        self.beats_per_measure
    }

    /// Returns the volume actually applied.
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = clamp_volume(volume);
        self.volume
    }

    pub(crate) fn set_current_beat(&mut self, beat: u32) {
        self.current_beat = beat;
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    #[cfg(test)]
    pub(crate) fn force_beats_per_measure(&mut self, beats: u32) {
        self.beats_per_measure = beats;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = MetronomeState::new();
        assert_eq!(state.tempo_bpm(), 120);
        assert_eq!(state.beats_per_measure(), 4);
        assert_eq!(state.volume(), 0.5);
        assert_eq!(state.current_beat(), 0);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_interval_formula() {
        assert_eq!(interval_ms(120), 500);
        assert_eq!(interval_ms(40), 1500);
        assert_eq!(interval_ms(208), 288);
        assert_eq!(interval_ms(60), 1000);
        assert_eq!(interval_ms(90), 667);
        assert_eq!(interval_ms(140), 429);
    }

    #[test]
    fn test_interval_matches_rounded_division_for_full_range() {
        for bpm in MIN_TEMPO_BPM..=MAX_TEMPO_BPM {
            let expected = (60_000.0_f64 / bpm as f64).round() as u64;
            assert_eq!(interval_ms(bpm), expected, "bpm {}", bpm);
        }
    }

    #[test]
    fn test_tempo_clamped() {
        let mut state = MetronomeState::new();
        assert_eq!(state.set_tempo(10), 40);
        assert_eq!(state.set_tempo(300), 208);
        assert_eq!(state.set_tempo(96), 96);
        assert_eq!(state.tempo_bpm(), 96);
    }

    #[test]
    fn test_beats_snapped_to_supported_set() {
        let mut state = MetronomeState::new();
        assert_eq!(state.set_beats_per_measure(0), 2);
        assert_eq!(state.set_beats_per_measure(1), 2);
        assert_eq!(state.set_beats_per_measure(3), 3);
        assert_eq!(state.set_beats_per_measure(5), 4);
        assert_eq!(state.set_beats_per_measure(7), 6);
        assert_eq!(state.set_beats_per_measure(12), 8);
        assert_eq!(state.set_beats_per_measure(6), 6);
    }

    #[test]
    fn test_volume_clamped() {
        let mut state = MetronomeState::new();
        assert_eq!(state.set_volume(-0.5), 0.0);
        assert_eq!(state.set_volume(1.5), 1.0);
        assert_eq!(state.set_volume(f32::NAN), 0.0);
        assert_eq!(state.set_volume(0.25), 0.25);
    }

    #[test]
    fn test_beats_change_keeps_current_beat() {
        let mut state = MetronomeState::new();
        state.set_current_beat(3);
        state.set_beats_per_measure(2);
        assert_eq!(state.current_beat(), 3);
    }

    #[test]
    fn test_from_config_clamps() {
        let config = MetronomeConfig {
            tempo_bpm: 500,
            beats_per_measure: 5,
            volume: 2.0,
        };
        let state = MetronomeState::from_config(&config);
        assert_eq!(state.tempo_bpm(), 208);
        assert_eq!(state.beats_per_measure(), 4);
        assert_eq!(state.volume(), 1.0);
        assert!(!state.is_playing());
    }
}
