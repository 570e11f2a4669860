use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook read failed: {0}")]
    Workbook(#[from] calamine::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input workbook not found: {0}. Put it in the repo root or set EXCEL_PATH.")]
    InputMissing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BuildError>;
