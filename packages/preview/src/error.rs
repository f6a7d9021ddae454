use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Renderer failed: {0}")]
    Render(String),

    #[error("Renderer answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Renderer response has no markup")]
    MissingMarkup,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Preview service has stopped")]
    ServiceStopped,
}

pub type PreviewResult<T> = Result<T, PreviewError>;
