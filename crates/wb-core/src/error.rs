use thiserror::Error;

/// Failures at the persistence boundary. Nothing inside the live board
/// produces errors; unknown ids and bad geometry are repaired in place.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),
    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
    #[error("snapshot root must be an object, found {0}")]
    NotAnObject(&'static str),
}
