#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid type expression: {0}")]
    TypeExpression(#[from] TypeParseError),
    #[error("Invalid entry reference '{0}': expected Type#method or Type.method")]
    InvalidEntry(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeParseError {
    #[error("empty type expression")]
    Empty,
    #[error("unbalanced brackets in '{0}'")]
    Unbalanced(String),
    #[error("unexpected token in '{text}' at offset {offset}")]
    Unexpected { text: String, offset: usize },
    #[error("trailing text in '{text}' at offset {offset}")]
    Trailing { text: String, offset: usize },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
