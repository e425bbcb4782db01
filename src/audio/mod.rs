// Audio module - click synthesis and non-blocking playback

pub mod click;
pub mod engine_cpal;
pub mod mixer;
pub mod output;

// Re-export commonly used types for convenience
pub use click::{synthesize, AudioBuffer, ClickSpec, ACCENT_RATIO};
pub use engine_cpal::CpalOutput;
pub use mixer::VoiceMixer;
pub use output::{AudioOutput, NullOutput};
