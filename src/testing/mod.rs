//! Test doubles for the session collaborators.
//!
//! Each double hands out cheap clones sharing one log, so a test can move a
//! clone into a [`crate::metronome::Session`] and inspect the one it kept.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::audio::{AudioBuffer, AudioOutput};
use crate::error::AudioError;
use crate::metronome::scheduler::TimerSource;
use crate::metronome::session::{BeatDisplay, Settings};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records every buffer it is asked to play.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    played: Arc<Mutex<Vec<AudioBuffer>>>,
    sample_rate: Option<u32>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `sample_rate` as the preferred render rate.
    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self {
            played: Arc::default(),
            sample_rate: Some(sample_rate),
        }
    }

    pub fn played(&self) -> Vec<AudioBuffer> {
        lock(&self.played).clone()
    }

    pub fn play_count(&self) -> usize {
        lock(&self.played).len()
    }
}

impl AudioOutput for RecordingOutput {
    fn play(&mut self, buffer: AudioBuffer) -> Result<(), AudioError> {
        lock(&self.played).push(buffer);
        Ok(())
    }

    fn preferred_sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }
}

/// Output whose device is permanently gone.
#[derive(Debug, Clone, Default)]
pub struct FailingOutput {
    attempts: Arc<Mutex<usize>>,
}

impl FailingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *lock(&self.attempts)
    }
}

impl AudioOutput for FailingOutput {
    fn play(&mut self, _buffer: AudioBuffer) -> Result<(), AudioError> {
        *lock(&self.attempts) += 1;
        Err(AudioError::DeviceUnavailable)
    }
}

/// What a display was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Beat(u32),
    Cleared,
    Settings(Settings),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        lock(&self.events).clone()
    }

    /// Only the beat numbers shown, in order.
    pub fn beats(&self) -> Vec<u32> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                DisplayEvent::Beat(beat) => Some(*beat),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<DisplayEvent> {
        lock(&self.events).last().cloned()
    }
}

impl BeatDisplay for RecordingDisplay {
    fn show_beat(&mut self, beat: u32) {
        lock(&self.events).push(DisplayEvent::Beat(beat));
    }

    fn clear(&mut self) {
        lock(&self.events).push(DisplayEvent::Cleared);
    }

    fn show_settings(&mut self, settings: &Settings) {
        lock(&self.events).push(DisplayEvent::Settings(*settings));
    }
}

#[derive(Debug, Default)]
struct ManualTimerLog {
    armed: Option<(Duration, u64)>,
    arm_count: usize,
    disarm_count: usize,
}

/// Timer that never fires on its own; tests call `Scheduler::fire` or
/// `Session::on_timer_elapsed` with [`ManualTimer::generation`].
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    log: Arc<Mutex<ManualTimerLog>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval of the currently armed cadence.
    pub fn armed(&self) -> Option<Duration> {
        lock(&self.log).armed.map(|(interval, _)| interval)
    }

    /// Generation of the currently armed cadence.
    pub fn generation(&self) -> Option<u64> {
        lock(&self.log).armed.map(|(_, generation)| generation)
    }

    pub fn arm_count(&self) -> usize {
        lock(&self.log).arm_count
    }

    pub fn disarm_count(&self) -> usize {
        lock(&self.log).disarm_count
    }
}

impl TimerSource for ManualTimer {
    fn arm(&mut self, interval: Duration, generation: u64) {
        let mut log = lock(&self.log);
        log.armed = Some((interval, generation));
        log.arm_count += 1;
    }

    fn disarm(&mut self) {
        let mut log = lock(&self.log);
        log.armed = None;
        log.disarm_count += 1;
    }
}
