use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rule parse error: {0}")]
    RuleParse(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpr(String),

    #[error("engine version mismatch: {0}")]
    EngineVersionMismatch(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
