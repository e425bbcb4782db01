// VoiceMixer - sums overlapping clicks into device output buffers
//
// Runs inside the audio callback. A new click must never cut off the one
// still ringing, so every queued buffer becomes an independent voice and the
// mixer adds all active voices sample by sample.
//
// Voice flow:
// 1. Control thread pushes a rendered click onto the play queue
// 2. Audio thread pops it and starts a voice
// 3. Voice is mixed until its samples are exhausted
// 4. Finished buffer goes back on the recycle queue so the control thread
//    frees it, keeping deallocation off the audio thread

use super::click::AudioBuffer;

/// One click being played back, resampled to the device rate.
#[derive(Debug)]
struct Voice {
    buffer: AudioBuffer,
    position: f64,
    step: f64,
}

impl Voice {
    fn new(buffer: AudioBuffer, device_rate: u32) -> Self {
        let step = buffer.sample_rate() as f64 / device_rate.max(1) as f64;
        Self {
            buffer,
            position: 0.0,
            step,
        }
    }

    fn is_finished(&self) -> bool {
        self.position >= self.buffer.len() as f64
    }

    /// Linear interpolation between neighbouring source samples.
    fn next_sample(&mut self) -> f32 {
        let samples = self.buffer.samples();
        let index = self.position as usize;
        let Some(&current) = samples.get(index) else {
            return 0.0;
        };
        let next = samples.get(index + 1).copied().unwrap_or(0.0);
        let frac = (self.position - index as f64) as f32;

        self.position += self.step;
        current + (next - current) * frac
    }
}

/// Mixes any number of concurrently sounding clicks.
#[derive(Debug)]
pub struct VoiceMixer {
    voices: Vec<Voice>,
    max_voices: usize,
    device_rate: u32,
}

impl VoiceMixer {
    /// Pre-allocates room for `max_voices` so starting a voice never grows the list.
    pub fn new(max_voices: usize, device_rate: u32) -> Self {
        let max_voices = max_voices.max(1);
        Self {
            voices: Vec::with_capacity(max_voices),
            max_voices,
            device_rate,
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Start playing a click.
    ///
    /// Returns the buffer of the oldest voice when the mixer is full and one
    /// had to be evicted.
    pub fn push(&mut self, buffer: AudioBuffer) -> Option<AudioBuffer> {
        let evicted = if self.voices.len() >= self.max_voices {
            Some(self.voices.remove(0).buffer)
        } else {
            None
        };
        self.voices.push(Voice::new(buffer, self.device_rate));
        evicted
    }

    /// Fill an interleaved output buffer, writing the same mono mix to every channel.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in data.chunks_mut(channels) {
            let mut mixed = 0.0_f32;
            for voice in self.voices.iter_mut() {
                mixed += voice.next_sample();
            }
            let mixed = mixed.clamp(-1.0, 1.0);
            for out in frame.iter_mut() {
                *out = mixed;
            }
        }
    }

    /// Remove finished voices, handing each buffer to `recycle`.
    pub fn drain_finished(&mut self, mut recycle: impl FnMut(AudioBuffer)) {
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished() {
                recycle(self.voices.remove(i).buffer);
            } else {
                i += 1;
            }
        }
    }
}
