use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaisseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column(s) in uploaded file: {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Line {line}, column '{column}': cannot read {value:?} as {expected}")]
    Format {
        line: u64,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Category table error: {0}")]
    Rules(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CaisseError>;
