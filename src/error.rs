use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Error parsing {context}: {message}")]
    Parse {
        context: &'static str,
        message: String,
    },

    #[error("A line {tokens:?} was not added to the report due to wrong formatting")]
    Format { tokens: Vec<String> },

    #[error("Insufficient data for report")]
    InsufficientData,

    #[error("Error generating report")]
    Generation(#[source] Box<ReportError>),

    #[error("PDF rendering failed: {0}")]
    Render(String),

    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub(crate) fn parse(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn render(err: impl std::fmt::Display) -> Self {
        Self::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
