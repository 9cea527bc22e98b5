use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeodesyError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeodesyError {
    #[error("invalid {field} ({value}): {reason}")]
    InvalidInput {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl GeodesyError {
    pub(crate) fn invalid(field: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidInput { field, value, reason }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => *field,
        }
    }
}
