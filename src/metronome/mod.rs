// Metronome module - beat state, sequencing, scheduling and the session glue

pub mod runtime;
pub mod scheduler;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod timer;

pub use runtime::{run_session, COMMAND_CHANNEL_CAPACITY};
pub use scheduler::{Scheduler, SchedulerState, Tick, TimerSource};
pub use sequencer::{next_beat, Beat, BeatSequencer};
pub use session::{BeatDisplay, Command, NoDisplay, Session, SessionStats, Settings};
pub use state::MetronomeState;
pub use timer::{TimerElapsed, TokioTimer};
