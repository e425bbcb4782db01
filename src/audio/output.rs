//! Output abstraction for rendered clicks.

use super::click::AudioBuffer;
use crate::error::AudioError;

/// Sink that plays rendered clicks.
///
/// `play` must return without waiting for the click to finish sounding and
/// must accept a new click while earlier ones are still playing. An error
/// means this one click was dropped; the caller keeps going.
pub trait AudioOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError>;

    /// Sample rate clicks should be rendered at, if the sink has a preference.
    fn preferred_sample_rate(&self) -> Option<u32> {
        None
    }
}

impl<T: AudioOutput + ?Sized> AudioOutput for Box<T> {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        (**self).play(buffer)
    }

    fn preferred_sample_rate(&self) -> Option<u32> {
        (**self).preferred_sample_rate()
    }
}

/// Silent output used when no device is available or sound is disabled.
#[derive(Debug, Default)]
pub struct NullOutput {
    discarded: u64,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl AudioOutput for NullOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        self.discarded += 1;
        log::trace!("[NullOutput] Discarding {} samples", buffer.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_output_accepts_everything() {
        let mut output = NullOutput::new();
        for _ in 0..3 {
            assert!(output.play(AudioBuffer::new(vec![0.5; 8], 44_100)).is_ok());
        }
        assert_eq!(output.discarded(), 3);
        assert_eq!(output.preferred_sample_rate(), None);
    }

    #[test]
    fn test_boxed_output_delegates() {
        let mut output: Box<dyn AudioOutput> = Box::new(NullOutput::new());
        assert!(output.play(AudioBuffer::new(Vec::new(), 44_100)).is_ok());
        assert_eq!(output.preferred_sample_rate(), None);
    }
}
