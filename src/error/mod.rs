// Error types for the metronome
//
// This module defines custom error types for audio output and metronome
// configuration, each carrying a stable numeric code for structured logging.

mod audio;
mod metronome;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use metronome::{log_metronome_error, MetronomeError, MetronomeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the session and its collaborators.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
