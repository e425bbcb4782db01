//! Event loop serializing input commands and timer expirations into a session.

use tokio::sync::mpsc;

use super::scheduler::TimerSource;
use super::session::{BeatDisplay, Command, Session};
use super::timer::TimerElapsed;
use crate::audio::AudioOutput;

/// Buffer size for the input command channel
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Drive `session` until a `Shutdown` command arrives or every command
/// sender is dropped. Returns the stopped session.
///
/// Commands and timer expirations are handled one at a time on the calling
/// task, so a tick and a setter never interleave. Commands win when both are
/// ready, which makes a stop take effect before a pending tick.
pub async fn run_session<O, D, T>(
    mut session: Session<O, D, T>,
    mut commands: mpsc::Receiver<Command>,
    mut timer_events: mpsc::UnboundedReceiver<TimerElapsed>,
) -> Session<O, D, T>
where
    O: AudioOutput,
    D: BeatDisplay,
    T: TimerSource,
{
    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => session.apply(command),
            },
            Some(elapsed) = timer_events.recv() => {
                session.on_timer_elapsed(elapsed.generation);
            }
        }
    }

    session.stop();
    log::info!(
        "[Runtime] Session ended: {} tick(s), {} click(s) played, {} failed",
        session.stats().ticks,
        session.stats().clicks_played,
        session.stats().clicks_failed
    );
    session
}
