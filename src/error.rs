use thiserror::Error;

/// Errors surfaced by the docking core.
///
/// Structural variants indicate programming errors: the caller referenced a
/// path or id that does not resolve. Deserialization variants are expected at
/// the `from_json` trust boundary and should be caught by the application.
/// Drag/drop races are never errors; they degrade to silent no-ops.
#[derive(Debug, Error)]
pub enum DockError {
    #[error("grid path {path:?} does not resolve to a node")]
    InvalidPath { path: Vec<usize> },
    #[error("unknown panel id {0:?}")]
    UnknownPanel(String),
    #[error("unknown group id {0:?}")]
    UnknownGroup(String),
    #[error("panel id {0:?} already exists in this instance")]
    DuplicatePanel(String),
    #[error("malformed layout document: {0}")]
    MalformedDocument(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = DockError> = std::result::Result<T, E>;
