//! Beat counting within a measure.

use super::state::{is_supported_beats_per_measure, MetronomeState};
use crate::error::MetronomeError;

/// Outcome of one sequencer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    /// 1-based position within the measure
    pub index: u32,
    /// First beat of the measure
    pub is_accent: bool,
}

/// Beat that follows `current` in a measure of `beats_per_measure` beats.
///
/// `current` may be 0 (nothing played yet) or larger than the measure after
/// the measure was shortened; both wrap through the modulo.
///
/// # Errors
/// `InvalidConfiguration` if `beats_per_measure` is not a supported measure length.
pub fn next_beat(current: u32, beats_per_measure: u32) -> Result<Beat, MetronomeError> {
    if !is_supported_beats_per_measure(beats_per_measure) {
        return Err(MetronomeError::invalid_configuration(
            "beats_per_measure",
            beats_per_measure,
        ));
    }

    let index = (current % beats_per_measure) + 1;
    Ok(Beat {
        index,
        is_accent: index == 1,
    })
}

/// Advances the beat counter held in a [`MetronomeState`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BeatSequencer;

impl BeatSequencer {
    pub fn new() -> Self {
        Self
    }

    /// Move to the next beat and record it in `state`.
    ///
    /// The state is left untouched on error.
    pub fn advance(&self, state: &mut MetronomeState) -> Result<Beat, MetronomeError> {
        let beat = next_beat(state.current_beat(), state.beats_per_measure())?;
        state.set_current_beat(beat.index);
        Ok(beat)
    }

    /// Rewind so the next advance yields beat 1.
    pub fn reset(&self, state: &mut MetronomeState) {
        state.set_current_beat(0);
    }
}
