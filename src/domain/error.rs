use thiserror::Error;

/// Core domain errors
///
/// Every variant maps to exactly one HTTP status at the API boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Already exists: {message}")]
    AlreadyExists { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Invalid token")]
    InvalidToken,

    #[error("Expired token")]
    ExpiredToken,

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::UnprocessableEntity {
            message: message.into(),
        }
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Short, client-facing message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::AlreadyExists { message }
            | Self::UnprocessableEntity { message }
            | Self::InvalidQuery { message }
            | Self::Storage { message }
            | Self::Configuration { message }
            | Self::Internal { message } => message.clone(),
            Self::InvalidToken => "Invalid token".to_string(),
            Self::ExpiredToken => "Token has expired".to_string(),
        }
    }

    /// Variant name, used as the log label at the API boundary
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BadRequestError",
            Self::Unauthorized { .. } => "UnauthorizedError",
            Self::Forbidden { .. } => "ForbiddenError",
            Self::NotFound { .. } => "NotFoundError",
            Self::AlreadyExists { .. } => "AlreadyExistsError",
            Self::UnprocessableEntity { .. } => "UnprocessableEntityError",
            Self::InvalidToken | Self::ExpiredToken => "InvalidTokenError",
            Self::InvalidQuery { .. } => "InvalidQueryError",
            Self::Storage { .. } => "StorageError",
            Self::Configuration { .. } => "ConfigurationError",
            Self::Internal { .. } => "InternalError",
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::already_exists(db_err.message().to_string());
            }
        }

        Self::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_error() {
        let error = DomainError::invalid_query("page and stream cannot both be set");
        assert_eq!(
            error.to_string(),
            "Invalid query parameters: page and stream cannot both be set"
        );
        assert_eq!(error.message(), "page and stream cannot both be set");
    }

    #[test]
    fn test_token_errors() {
        assert_eq!(DomainError::InvalidToken.message(), "Invalid token");
        assert_eq!(DomainError::ExpiredToken.message(), "Token has expired");
        assert_eq!(DomainError::ExpiredToken.kind(), "InvalidTokenError");
    }

    #[test]
    fn test_row_not_found_is_storage_error() {
        let error: DomainError = sqlx::Error::RowNotFound.into();
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
