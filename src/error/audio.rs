// Audio output error types and constants

use crate::error::ErrorCode;
use log::warn;
use std::fmt;

/// Audio error code constants
///
/// Error code range: 1001-1005
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No default output device is available
    pub const DEVICE_UNAVAILABLE: i32 = 1001;

    /// Failed to open the output stream
    pub const STREAM_OPEN_FAILED: i32 = 1002;

    /// Device reported a sample format the mixer cannot write
    pub const UNSUPPORTED_SAMPLE_FORMAT: i32 = 1003;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1004;

    /// Playback queue to the audio thread is full
    pub const QUEUE_FULL: i32 = 1005;
}

/// Log an audio error with structured context
///
/// Audio errors are never fatal to a metronome session, so they are
/// reported at warning level. The logging is non-blocking and will not
/// panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    warn!(
        "Audio error in {}: code={}, component=AudioOutput, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover output device discovery, stream management and
/// the hand-off of click buffers to the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No default output device found
    DeviceUnavailable,

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Sample format not supported by the mixer
    UnsupportedSampleFormat { format: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// The audio thread has not drained previously queued clicks
    QueueFull,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceUnavailable => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::UnsupportedSampleFormat { .. } => {
                AudioErrorCodes::UNSUPPORTED_SAMPLE_FORMAT
            }
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::QueueFull => AudioErrorCodes::QUEUE_FULL,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable => "No default output device found".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::UnsupportedSampleFormat { format } => {
                format!("Unsupported output sample format: {}", format)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::QueueFull => {
                "Playback queue full, click dropped".to_string()
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::DeviceUnavailable.code(),
            AudioErrorCodes::DEVICE_UNAVAILABLE
        );
        assert_eq!(
            AudioError::StreamOpenFailed {
                reason: "test".to_string()
            }
            .code(),
            AudioErrorCodes::STREAM_OPEN_FAILED
        );
        assert_eq!(
            AudioError::UnsupportedSampleFormat {
                format: "I16".to_string()
            }
            .code(),
            AudioErrorCodes::UNSUPPORTED_SAMPLE_FORMAT
        );
        assert_eq!(
            AudioError::HardwareError {
                details: "test".to_string()
            }
            .code(),
            AudioErrorCodes::HARDWARE_ERROR
        );
        assert_eq!(AudioError::QueueFull.code(), AudioErrorCodes::QUEUE_FULL);
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::HardwareError {
            details: "test error".to_string(),
        };
        assert_eq!(err.message(), "Hardware error: test error");

        let err = AudioError::UnsupportedSampleFormat {
            format: "U16".to_string(),
        };
        assert!(err.message().contains("U16"));

        assert!(AudioError::QueueFull.message().contains("dropped"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::DeviceUnavailable;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }
}
