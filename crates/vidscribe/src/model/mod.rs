//! Domain types shared by the store, the recognition client and the orchestrator.

pub mod job;
pub mod options;
pub mod progress;
pub mod video;

pub use job::{RemoteJobStatus, TranscriptionJob};
pub use options::{RecognitionSettings, TranscriptionOptions, MAX_ALTERNATIVES};
pub use progress::{remote_progress, ProgressSnapshot};
pub use video::{TranscriptionStatus, Video};
