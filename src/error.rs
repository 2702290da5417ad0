use thiserror::Error;

/// Errors surfaced at the UI boundary. Every variant is recoverable:
/// commands stringify these and the frontend shows them as a message.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed transcript: {0}")]
    MalformedTranscript(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Missing file path: {0}")]
    MissingFilePath(String),

    #[error("Backend error: {0}")]
    BackendError(String),
}

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}
