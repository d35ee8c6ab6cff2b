//! Real-time streaming of transcription progress to subscribers.

pub mod progress;

pub use progress::{ProgressBroadcaster, ProgressEvent};
