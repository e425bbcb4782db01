// Metronome configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Metronome error code constants
///
/// Error code range: 2001-2002
pub struct MetronomeErrorCodes {}

impl MetronomeErrorCodes {
    /// Tempo, beats per measure or volume outside the supported range
    pub const INVALID_CONFIGURATION: i32 = 2001;

    /// Click synthesis parameters violate their constraints
    pub const INVALID_CLICK_SPEC: i32 = 2002;
}

/// Log a metronome error with structured context
pub fn log_metronome_error(err: &MetronomeError, context: &str) {
    error!(
        "Metronome error in {}: code={}, component=Session, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Metronome state and click parameter errors
#[derive(Debug, Clone, PartialEq)]
pub enum MetronomeError {
    /// A metronome parameter holds an unsupported value
    InvalidConfiguration { parameter: String, value: String },

    /// Click parameters cannot be synthesized
    InvalidClickSpec { reason: String },
}

impl MetronomeError {
    pub(crate) fn invalid_configuration(parameter: &str, value: impl fmt::Display) -> Self {
        MetronomeError::InvalidConfiguration {
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }
}

impl ErrorCode for MetronomeError {
    fn code(&self) -> i32 {
        match self {
            MetronomeError::InvalidConfiguration { .. } => {
                MetronomeErrorCodes::INVALID_CONFIGURATION
            }
            MetronomeError::InvalidClickSpec { .. } => MetronomeErrorCodes::INVALID_CLICK_SPEC,
        }
    }

    fn message(&self) -> String {
        match self {
            MetronomeError::InvalidConfiguration { parameter, value } => {
                format!("Invalid configuration: {} = {}", parameter, value)
            }
            MetronomeError::InvalidClickSpec { reason } => {
                format!("Invalid click spec: {}", reason)
            }
        }
    }
}

impl fmt::Display for MetronomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetronomeError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for MetronomeError {}
