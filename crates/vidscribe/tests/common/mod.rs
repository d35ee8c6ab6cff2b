//! Shared test utilities for vidscribe integration tests.
//!
//! - `TestHarness`: orchestrator over an in-memory store with scripted fakes
//! - builders for recognition result artifacts

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{FakeArtifactStore, FakeRecognitionClient, TestHarness, ARTIFACT_URI, BUCKET};
