// Metronome Core - click synthesis, beat sequencing and tick scheduling
// Periodic audible clicks with an accented downbeat and a beat indicator hook

// Module declarations
pub mod audio;
pub mod config;
pub mod error;
pub mod metronome;
pub mod testing;

// Re-exports for convenience
pub use audio::{AudioBuffer, AudioOutput, ClickSpec};
pub use config::AppConfig;
pub use error::{AudioError, ErrorCode, MetronomeError};
pub use metronome::{BeatDisplay, Command, MetronomeState, Session};
