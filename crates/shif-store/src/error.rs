use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("input not found: {0}")]
    InputNotFound(std::path::PathBuf),

    /// The document cannot be opened or parsed at all.
    #[error("malformed input{}: {message}", page_suffix(.page))]
    MalformedInput { message: String, page: Option<u32> },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
            page: None,
        }
    }

    pub fn malformed_at(message: impl Into<String>, page: u32) -> Self {
        Self::MalformedInput {
            message: message.into(),
            page: Some(page),
        }
    }
}

fn page_suffix(page: &Option<u32>) -> String {
    page.map(|p| format!(" (page {p})")).unwrap_or_default()
}
