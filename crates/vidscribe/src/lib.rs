pub mod artifact;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod language;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod recognition;
pub mod secrets;
pub mod store;
pub mod telemetry;

pub use artifact::{ArtifactError, ArtifactLocation, ArtifactStore, FsArtifactStore, HttpArtifactStore};
pub use broadcast::{ProgressBroadcaster, ProgressEvent};
pub use config::{load_config, load_config_from_str, OrchestratorConfig};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, Result, SetupError, TranscriptionError};
pub use language::{resolve_language_code, supported_languages};
pub use model::{
    ProgressSnapshot, RecognitionSettings, RemoteJobStatus, TranscriptionJob,
    TranscriptionOptions, TranscriptionStatus, Video,
};
pub use orchestrator::{PollScheduler, TranscriptionOrchestrator, CANCELED_REASON};
pub use parser::{parse, ParseError, ParsedTranscript};
pub use recognition::{
    HttpRecognitionClient, RecognitionError, RemoteJob, SpeechRecognitionClient, SubmitRequest,
};
pub use secrets::{SecretError, SecretSource};
pub use store::{RecordStore, SqliteRecordStore};
pub use telemetry::init_logging;
