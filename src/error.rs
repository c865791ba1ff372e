use std::fmt;

use thiserror::Error;

pub type BotResult<T> = Result<T, BotError>;

/// Which user-supplied input a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Symbol,
    Side,
    Quantity,
    Price,
    StopPrice,
    LimitPrice,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Symbol => "symbol",
            Field::Side => "side",
            Field::Quantity => "quantity",
            Field::Price => "price",
            Field::StopPrice => "stop price",
            Field::LimitPrice => "limit price",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Rejection reported by the exchange, e.g. `{"code":-2011,"msg":"Unknown order sent."}`.
    #[error("exchange error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status whose body is not an exchange error document.
    #[error("unexpected HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse grouping used when reporting a failed operation to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Exchange,
    Unexpected,
}

impl BotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BotError::Validation(_) => ErrorKind::Validation,
            BotError::Api { .. } => ErrorKind::Exchange,
            BotError::Transport(_)
            | BotError::Http { .. }
            | BotError::Decode(_)
            | BotError::Config(_) => ErrorKind::Unexpected,
        }
    }

    pub fn validation_field(&self) -> Option<Field> {
        match self {
            BotError::Validation(e) => Some(e.field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err: BotError = ValidationError::new(Field::StopPrice, "must be positive").into();
        assert_eq!(err.to_string(), "invalid stop price: must be positive");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation_field(), Some(Field::StopPrice));
    }

    #[test]
    fn test_error_kinds() {
        let api = BotError::Api {
            code: -2011,
            message: "Unknown order sent.".to_string(),
        };
        assert_eq!(api.kind(), ErrorKind::Exchange);
        assert_eq!(api.to_string(), "exchange error -2011: Unknown order sent.");
        assert_eq!(api.validation_field(), None);

        let decode = BotError::Decode("missing field `price`".to_string());
        assert_eq!(decode.kind(), ErrorKind::Unexpected);
    }
}
