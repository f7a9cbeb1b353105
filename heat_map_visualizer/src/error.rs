use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid output settings: {0}")]
    InvalidSettings(String),
    #[error("i/o error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load label font: {0}")]
    Font(String),
    #[error("image processing failed")]
    Image(#[from] image::ImageError),
    #[error("failed to serialize heat map record")]
    Json(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

impl RenderError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        RenderError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
