use thiserror::Error;

pub type Result<T, E = PayError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum PayError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("url: {0}")]
    Url(#[from] url::ParseError),
    #[error("HTTP response header not found")]
    HeaderNotFound,
    #[error("invalid status line: {0}")]
    InvalidStatusLine(String),
    #[error("HTTP request failed with status code: {0}")]
    HttpStatus(u16),
    #[error("xml: {0}")]
    Xml(String),
    #[error("format: {0}")]
    Format(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("gateway: code={code}, message={message}")]
    Gateway { code: String, message: String },
    #[error("failed after {attempts} attempts: {source}")]
    RetryExhausted {
        attempts: usize,
        #[source]
        source: Box<PayError>,
    },
}

impl PayError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        PayError::Format(msg.into())
    }
}
