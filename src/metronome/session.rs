//! Session: ties state, sequencer, scheduler, click synthesis and output together.
//!
//! All mutation goes through `&mut self`, so a session driven from one task
//! (see [`super::runtime::run_session`]) never needs a lock around its state.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scheduler::{Scheduler, TimerSource, Tick};
use super::sequencer::BeatSequencer;
use super::state::MetronomeState;
use crate::audio::{synthesize, AudioBuffer, AudioOutput, ClickSpec};
use crate::config::{AppConfig, ClickConfig};
use crate::error::{log_audio_error, log_metronome_error, MetronomeError};

/// User-adjustable values, as reported to the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub tempo_bpm: u32,
    pub beats_per_measure: u32,
    pub volume: f32,
}

impl From<&MetronomeState> for Settings {
    fn from(state: &MetronomeState) -> Self {
        Self {
            tempo_bpm: state.tempo_bpm(),
            beats_per_measure: state.beats_per_measure(),
            volume: state.volume(),
        }
    }
}

/// Presentation side of the beat indicator.
pub trait BeatDisplay {
    /// A tick produced beat `beat` (1-based).
    fn show_beat(&mut self, beat: u32);

    /// Playback stopped; blank the indicator.
    fn clear(&mut self);

    /// A setter changed; reflect the effective values in the controls.
    fn show_settings(&mut self, _settings: &Settings) {}
}

impl<T: BeatDisplay + ?Sized> BeatDisplay for Box<T> {
    fn show_beat(&mut self, beat: u32) {
        (**self).show_beat(beat)
    }

    fn clear(&mut self) {
        (**self).clear()
    }

    fn show_settings(&mut self, settings: &Settings) {
        (**self).show_settings(settings)
    }
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl BeatDisplay for NoDisplay {
    fn show_beat(&mut self, _beat: u32) {}
    fn clear(&mut self) {}
}

/// Input-side requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum Command {
    SetTempo(u32),
    SetBeatsPerMeasure(u32),
    SetVolume(f32),
    TogglePlay,
    Shutdown,
}

/// Parses terminal input such as `tempo 140`, `beats 3`, `volume 0.8`,
/// `toggle` (or an empty line) and `quit`.
impl FromStr for Command {
    type Err = MetronomeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let invalid = || MetronomeError::invalid_configuration("command", line.trim());

        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or("").to_ascii_lowercase();
        let argument = parts.next();
        if parts.next().is_some() {
            return Err(invalid());
        }

        match (verb.as_str(), argument) {
            ("tempo" | "bpm", Some(value)) => {
                value.parse().map(Command::SetTempo).map_err(|_| invalid())
            }
            ("beats", Some(value)) => value
                .parse()
                .map(Command::SetBeatsPerMeasure)
                .map_err(|_| invalid()),
            ("volume" | "vol", Some(value)) => {
                value.parse().map(Command::SetVolume).map_err(|_| invalid())
            }
            ("" | "toggle" | "t", None) => Ok(Command::TogglePlay),
            ("quit" | "exit" | "q", None) => Ok(Command::Shutdown),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Ticks that advanced the beat
    pub ticks: u64,
    /// Clicks accepted by the output
    pub clicks_played: u64,
    /// Clicks that could not be rendered or played
    pub clicks_failed: u64,
}

/// Everything a tick touches, kept apart from the scheduler so the tick
/// callback can borrow it while the scheduler is borrowed too.
struct TickContext<O, D> {
    state: MetronomeState,
    sequencer: BeatSequencer,
    click: ClickConfig,
    output: O,
    display: D,
    stats: SessionStats,
    audio_failing: bool,
}

impl<O: AudioOutput, D: BeatDisplay> TickContext<O, D> {
    fn on_tick(&mut self, tick: Tick) {
        let beat = match self.sequencer.advance(&mut self.state) {
            Ok(beat) => beat,
            Err(err) => {
                log_metronome_error(&err, "tick");
                return;
            }
        };
        self.stats.ticks += 1;

        match self.render_click(beat.is_accent) {
            Ok(buffer) => self.play(buffer),
            Err(err) => {
                self.stats.clicks_failed += 1;
                log_metronome_error(&err, "render_click");
            }
        }

        self.display.show_beat(beat.index);
        tracing::debug!(
            "[Session] Tick {} -> beat {}/{}{}",
            tick.sequence,
            beat.index,
            self.state.beats_per_measure(),
            if beat.is_accent { " (accent)" } else { "" }
        );
    }

    fn render_click(&self, is_accent: bool) -> Result<AudioBuffer, MetronomeError> {
        let sample_rate = self
            .output
            .preferred_sample_rate()
            .unwrap_or(self.click.sample_rate);
        let spec = ClickSpec::new(
            self.click.frequency_hz,
            self.click.duration_sec,
            sample_rate,
            self.state.volume(),
        )?;
        Ok(synthesize(&spec, is_accent))
    }

    fn play(&mut self, buffer: AudioBuffer) {
        match self.output.play(buffer) {
            Ok(()) => {
                self.stats.clicks_played += 1;
                if self.audio_failing {
                    log::info!("[Session] Audio output recovered");
                    self.audio_failing = false;
                }
            }
            Err(err) => {
                self.stats.clicks_failed += 1;
                // Warn once per outage; the beat keeps going either way
                if !self.audio_failing {
                    log_audio_error(&err, "play_click");
                    self.audio_failing = true;
                } else {
                    log::debug!("[Session] Click dropped: {}", err);
                }
            }
        }
    }

    fn report_settings(&mut self) {
        let settings = Settings::from(&self.state);
        self.display.show_settings(&settings);
    }
}

/// Metronome session controller.
pub struct Session<O, D, T> {
    scheduler: Scheduler<T>,
    core: TickContext<O, D>,
}

impl<O, D, T> Session<O, D, T>
where
    O: AudioOutput,
    D: BeatDisplay,
    T: TimerSource,
{
    /// Create a stopped session with the configured defaults.
    pub fn new(config: &AppConfig, output: O, display: D, timer: T) -> Self {
        Self {
            scheduler: Scheduler::new(timer),
            core: TickContext {
                state: MetronomeState::from_config(&config.metronome),
                sequencer: BeatSequencer::new(),
                click: validated_click(&config.click),
                output,
                display,
                stats: SessionStats::default(),
                audio_failing: false,
            },
        }
    }

    pub fn state(&self) -> &MetronomeState {
        &self.core.state
    }

    pub fn settings(&self) -> Settings {
        Settings::from(&self.core.state)
    }

    pub fn stats(&self) -> SessionStats {
        self.core.stats
    }

    pub fn is_playing(&self) -> bool {
        self.core.state.is_playing()
    }

    pub fn scheduler(&self) -> &Scheduler<T> {
        &self.scheduler
    }

    pub fn output(&self) -> &O {
        &self.core.output
    }

    pub fn display(&self) -> &D {
        &self.core.display
    }

    /// Set the tempo, clamped to the supported range.
    ///
    /// While playing, the armed interval is kept; the new tempo applies from
    /// the next start.
    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        let applied = self.core.state.set_tempo(bpm);
        if applied != bpm {
            log::info!("[Session] Tempo {} clamped to {}", bpm, applied);
        }
        if self.is_playing() {
            log::info!(
                "[Session] Tempo {} BPM takes effect on next start",
                applied
            );
        }
        self.core.report_settings();
        applied
    }

    /// Set the measure length, snapped to the nearest supported value.
    pub fn set_beats_per_measure(&mut self, beats: u32) -> u32 {
        let applied = self.core.state.set_beats_per_measure(beats);
        if applied != beats {
            log::info!("[Session] Beats per measure {} snapped to {}", beats, applied);
        }
        self.core.report_settings();
        applied
    }

    /// Set the click volume, clamped to [0, 1].
    pub fn set_volume(&mut self, volume: f32) -> f32 {
        let applied = self.core.state.set_volume(volume);
        self.core.report_settings();
        applied
    }

    pub fn toggle_play(&mut self) {
        if self.is_playing() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Start playback; the first beat sounds immediately.
    ///
    /// Returns `false` if already playing.
    pub fn start(&mut self) -> bool {
        if self.scheduler.is_running() {
            return false;
        }

        let interval_ms = self.core.state.interval_ms();
        let core = &mut self.core;
        core.sequencer.reset(&mut core.state);
        core.state.set_playing(true);
        self.scheduler.start(interval_ms, |tick| core.on_tick(tick));

        log::info!(
            "[Session] Started at {} BPM, {} beats per measure ({} ms interval)",
            self.core.state.tempo_bpm(),
            self.core.state.beats_per_measure(),
            interval_ms
        );
        true
    }

    /// Stop playback. Clicks already handed to the output finish sounding.
    ///
    /// Returns `false` if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.scheduler.stop() {
            return false;
        }

        let core = &mut self.core;
        core.state.set_playing(false);
        core.sequencer.reset(&mut core.state);
        core.display.clear();

        log::info!("[Session] Stopped after {} tick(s)", core.stats.ticks);
        true
    }

    /// Called by the event loop when the timer armed with `generation` elapsed.
    pub fn on_timer_elapsed(&mut self, generation: u64) -> bool {
        let core = &mut self.core;
        self.scheduler.fire(generation, |tick| core.on_tick(tick))
    }

    /// Dispatch an input command.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::SetTempo(bpm) => {
                self.set_tempo(bpm);
            }
            Command::SetBeatsPerMeasure(beats) => {
                self.set_beats_per_measure(beats);
            }
            Command::SetVolume(volume) => {
                self.set_volume(volume);
            }
            Command::TogglePlay => self.toggle_play(),
            Command::Shutdown => {
                self.stop();
            }
        }
    }
}

/// Click settings that can actually be synthesized, falling back to defaults.
fn validated_click(click: &ClickConfig) -> ClickConfig {
    match ClickSpec::new(click.frequency_hz, click.duration_sec, click.sample_rate, 1.0) {
        Ok(_) => click.clone(),
        Err(err) => {
            log_metronome_error(&err, "click_config");
            log::warn!("[Session] Using default click settings");
            ClickConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DisplayEvent, FailingOutput, ManualTimer, RecordingDisplay, RecordingOutput};
    use std::time::Duration;

    type TestSession = Session<RecordingOutput, RecordingDisplay, ManualTimer>;

    fn session() -> (TestSession, RecordingOutput, RecordingDisplay, ManualTimer) {
        let output = RecordingOutput::new();
        let display = RecordingDisplay::new();
        let timer = ManualTimer::new();
        let session = Session::new(
            &AppConfig::default(),
            output.clone(),
            display.clone(),
            timer.clone(),
        );
        (session, output, display, timer)
    }

    fn fire(session: &mut TestSession, timer: &ManualTimer, times: usize) {
        let generation = timer.generation().expect("timer armed");
        for _ in 0..times {
            assert!(session.on_timer_elapsed(generation));
        }
    }

    #[test]
    fn test_new_session_is_stopped_with_defaults() {
        let (session, output, display, timer) = session();
        assert!(!session.is_playing());
        assert_eq!(
            session.settings(),
            Settings {
                tempo_bpm: 120,
                beats_per_measure: 4,
                volume: 0.5
            }
        );
        assert_eq!(output.play_count(), 0);
        assert!(display.events().is_empty());
        assert_eq!(timer.armed(), None);
    }

    #[test]
    fn test_toggle_plays_first_beat_immediately() {
        let (mut session, output, display, timer) = session();
        session.toggle_play();

        assert!(session.is_playing());
        assert_eq!(session.state().current_beat(), 1);
        assert_eq!(output.play_count(), 1);
        assert_eq!(display.beats(), vec![1]);
        assert_eq!(timer.armed(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_ticks_cycle_beats_and_accent_pitch() {
        let (mut session, output, display, timer) = session();
        session.start();
        fire(&mut session, &timer, 4);

        assert_eq!(display.beats(), vec![1, 2, 3, 4, 1]);
        let played = output.played();
        assert_eq!(played.len(), 5);
        assert!(played.iter().all(|buffer| buffer.len() == 4410));
        // Accented and plain clicks differ only in pitch
        assert_eq!(played[0], played[4]);
        assert_ne!(played[0], played[1]);
        assert_eq!(played[1], played[2]);
        assert_eq!(session.stats().ticks, 5);
    }

    #[test]
    fn test_start_then_stop_produces_one_tick() {
        let (mut session, output, display, timer) = session();
        session.start();
        let generation = timer.generation().unwrap();
        session.stop();

        assert!(!session.on_timer_elapsed(generation));
        assert_eq!(output.play_count(), 1);
        assert_eq!(
            display.events(),
            vec![DisplayEvent::Beat(1), DisplayEvent::Cleared]
        );
        assert_eq!(timer.armed(), None);
        assert_eq!(session.state().current_beat(), 0);
    }

    #[test]
    fn test_restart_begins_at_beat_one() {
        let (mut session, _output, display, timer) = session();
        session.toggle_play();
        fire(&mut session, &timer, 2);
        session.toggle_play();
        session.toggle_play();

        assert_eq!(display.beats(), vec![1, 2, 3, 1]);
    }

    #[test]
    fn test_repeated_start_and_stop_are_noops() {
        let (mut session, output, _display, timer) = session();
        assert!(!session.stop());
        assert!(session.start());
        assert!(!session.start());
        assert_eq!(output.play_count(), 1);
        assert_eq!(timer.arm_count(), 1);
    }

    #[test]
    fn test_tempo_change_deferred_until_restart() {
        let (mut session, _output, _display, timer) = session();
        session.start();
        assert_eq!(session.set_tempo(60), 60);

        assert_eq!(timer.armed(), Some(Duration::from_millis(500)));
        assert_eq!(session.scheduler().interval_ms(), Some(500));

        session.stop();
        session.start();
        assert_eq!(timer.armed(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_beats_change_applies_on_next_tick_without_reset() {
        let (mut session, _output, display, timer) = session();
        session.start();
        fire(&mut session, &timer, 2);
        assert_eq!(session.state().current_beat(), 3);

        session.set_beats_per_measure(2);
        fire(&mut session, &timer, 2);
        // 3 % 2 + 1 = 2, then wraps to 1
        assert_eq!(display.beats(), vec![1, 2, 3, 2, 1]);
    }

    #[test]
    fn test_setters_clamp_and_report() {
        let (mut session, _output, display, _timer) = session();
        assert_eq!(session.set_tempo(20), 40);
        assert_eq!(session.set_beats_per_measure(5), 4);
        assert_eq!(session.set_volume(3.0), 1.0);

        assert_eq!(
            display.last(),
            Some(DisplayEvent::Settings(Settings {
                tempo_bpm: 40,
                beats_per_measure: 4,
                volume: 1.0
            }))
        );
    }

    #[test]
    fn test_zero_volume_plays_silent_clicks() {
        let (mut session, output, _display, _timer) = session();
        session.set_volume(0.0);
        session.start();
        assert!(output.played()[0].samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_audio_failure_is_not_fatal() {
        let display = RecordingDisplay::new();
        let output = FailingOutput::new();
        let timer = ManualTimer::new();
        let mut session = Session::new(
            &AppConfig::default(),
            output.clone(),
            display.clone(),
            timer.clone(),
        );

        session.start();
        let generation = timer.generation().unwrap();
        session.on_timer_elapsed(generation);
        session.on_timer_elapsed(generation);

        assert!(session.is_playing());
        assert_eq!(display.beats(), vec![1, 2, 3]);
        assert_eq!(output.attempts(), 3);
        assert_eq!(session.stats().clicks_failed, 3);
        assert_eq!(session.stats().clicks_played, 0);
    }

    #[test]
    fn test_click_rendered_at_output_rate() {
        let output = RecordingOutput::with_sample_rate(48_000);
        let mut session = Session::new(
            &AppConfig::default(),
            output.clone(),
            NoDisplay,
            ManualTimer::new(),
        );
        session.start();

        let played = output.played();
        assert_eq!(played[0].sample_rate(), 48_000);
        assert_eq!(played[0].len(), 4800);
    }

    #[test]
    fn test_invalid_click_config_falls_back() {
        let mut config = AppConfig::default();
        config.click.frequency_hz = -5.0;
        let output = RecordingOutput::new();
        let mut session = Session::new(&config, output.clone(), NoDisplay, ManualTimer::new());
        session.start();

        assert_eq!(output.play_count(), 1);
        assert_eq!(session.stats().clicks_failed, 0);
    }

    #[test]
    fn test_apply_commands() {
        let (mut session, _output, _display, _timer) = session();
        session.apply(Command::SetTempo(90));
        session.apply(Command::SetBeatsPerMeasure(3));
        session.apply(Command::SetVolume(0.8));
        session.apply(Command::TogglePlay);
        assert!(session.is_playing());

        session.apply(Command::Shutdown);
        assert!(!session.is_playing());
        assert_eq!(
            session.settings(),
            Settings {
                tempo_bpm: 90,
                beats_per_measure: 3,
                volume: 0.8
            }
        );
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&Command::SetTempo(140)).unwrap();
        assert_eq!(json, r#"{"command":"set_tempo","value":140}"#);

        let parsed: Command = serde_json::from_str(r#"{"command":"toggle_play"}"#).unwrap();
        assert_eq!(parsed, Command::TogglePlay);
    }

    #[test]
    fn test_parse_terminal_commands() {
        assert_eq!("tempo 140".parse::<Command>().unwrap(), Command::SetTempo(140));
        assert_eq!("BPM 90".parse::<Command>().unwrap(), Command::SetTempo(90));
        assert_eq!(
            "beats 3".parse::<Command>().unwrap(),
            Command::SetBeatsPerMeasure(3)
        );
        assert_eq!(
            " volume 0.8 ".parse::<Command>().unwrap(),
            Command::SetVolume(0.8)
        );
        assert_eq!("".parse::<Command>().unwrap(), Command::TogglePlay);
        assert_eq!("toggle".parse::<Command>().unwrap(), Command::TogglePlay);
        assert_eq!("q".parse::<Command>().unwrap(), Command::Shutdown);
    }

    #[test]
    fn test_parse_rejects_malformed_commands() {
        for line in ["tempo", "tempo fast", "tempo -5", "beats 3 4", "dance", "quit now"] {
            match line.parse::<Command>() {
                Err(MetronomeError::InvalidConfiguration { parameter, .. }) => {
                    assert_eq!(parameter, "command")
                }
                other => panic!("Expected parse failure for {:?}, got {:?}", line, other),
            }
        }
    }
}
