use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error at position {position}: {source}")]
    Xml {
        source: quick_xml::Error,
        position: usize,
    },

    #[error("Malformed coverage report: {0}")]
    Malformed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
