//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Command error: {0}")]
    Command(#[from] crate::commands::CommandError),

    #[error("Field error: {0}")]
    Field(#[from] crate::field::FieldError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Upload error: {0}")]
    Upload(#[from] crate::store::UploadError),
}
