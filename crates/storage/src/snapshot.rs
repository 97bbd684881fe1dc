//! Wire format of the persisted learner snapshot.

use serde::{Deserialize, Serialize};
use tutor_core::LearnerState;

use crate::repository::StorageError;

/// Fixed key the learner snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "learner-store";

/// Current layout version written by `encode`.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a LearnerState,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    version: u32,
    state: LearnerState,
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Serializes the state together with its layout version.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the state cannot be encoded.
pub fn encode(state: &LearnerState) -> Result<String, StorageError> {
    serde_json::to_string(&EnvelopeRef {
        version: SNAPSHOT_VERSION,
        state,
    })
    .map_err(ser)
}

/// Restores a state written by `encode`.
///
/// # Errors
///
/// Returns `StorageError::Serialization` for malformed payloads or a layout
/// version newer than this build understands.
pub fn decode(payload: &str) -> Result<LearnerState, StorageError> {
    let envelope: Envelope = serde_json::from_str(payload).map_err(ser)?;
    if envelope.version > SNAPSHOT_VERSION {
        return Err(StorageError::Serialization(format!(
            "unsupported snapshot version {}",
            envelope.version
        )));
    }
    Ok(envelope.state)
}
