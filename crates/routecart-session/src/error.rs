//! # Session Error Types
//!
//! Errors of the session layer and their client-facing form.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in RouteCart                              │
//! │                                                                         │
//! │  SaleSession::checkout()                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Cart rule broken? ───── CoreError::StockExceeded ──────┐               │
//! │         │                                               │               │
//! │         ▼                                               ▼               │
//! │  Backend failed? ─────── BackendError::Unavailable ── SessionError      │
//! │         │                                               │               │
//! │         ▼                                               ▼               │
//! │  Success                                     ApiError { code, message } │
//! │                                              (what the screen shows)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use routecart_core::CoreError;

// =============================================================================
// Backend Error
// =============================================================================

/// Failures reported by a [`crate::backend::Backend`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network down, timeout, or server unreachable.
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// The backend refused the request.
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The requested record does not exist on the backend.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The response could not be decoded.
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::InvalidResponse(err.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

// =============================================================================
// Session Error
// =============================================================================

#[derive(Debug, Error)]
pub enum SessionError {
    /// A cart, pricing or payment rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Split payments cannot be spread over several merchant orders.
    #[error("Split payment is not supported when the cart holds {merchants} merchants")]
    SplitAcrossMerchants { merchants: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

// =============================================================================
// API Error
// =============================================================================

/// Error as shown to a client screen.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Only 1 box of WATER-500 available" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    UnsupportedUnit,
    CartError,
    PaymentError,
    CustomerRequired,
    CreditLimitExceeded,
    BackendUnavailable,
    BackendRejected,
    ConfigError,
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::LineNotFound { .. } => ApiError::new(ErrorCode::NotFound, message),
            CoreError::UnsupportedUnitType { .. } => {
                ApiError::new(ErrorCode::UnsupportedUnit, message)
            }
            CoreError::StockExceeded { .. } => ApiError::new(ErrorCode::InsufficientStock, message),
            CoreError::CartTooLarge { .. } | CoreError::EmptyCart => {
                ApiError::new(ErrorCode::CartError, message)
            }
            CoreError::InvalidSplitAmount { .. }
            | CoreError::NonPositiveAmount { .. }
            | CoreError::AmountExceedsBalance { .. }
            | CoreError::AllocationMismatch { .. } => ApiError::new(ErrorCode::PaymentError, message),
            CoreError::CreditLimitExceeded { .. } => {
                ApiError::new(ErrorCode::CreditLimitExceeded, message)
            }
            CoreError::NoCustomerSelected => ApiError::new(ErrorCode::CustomerRequired, message),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(reason) => {
                tracing::warn!(%reason, "Backend unavailable");
                ApiError::new(
                    ErrorCode::BackendUnavailable,
                    "Could not reach the server. Check the connection and try again.",
                )
            }
            BackendError::Rejected { message, .. } => {
                ApiError::new(ErrorCode::BackendRejected, message)
            }
            BackendError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            BackendError::InvalidResponse(reason) => {
                // Log the decode failure, show a generic message
                tracing::error!(%reason, "Invalid backend response");
                ApiError::new(ErrorCode::Internal, "Unexpected response from the server")
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Core(e) => e.into(),
            SessionError::Backend(e) => e.into(),
            e @ SessionError::SplitAcrossMerchants { .. } => {
                ApiError::new(ErrorCode::PaymentError, e.to_string())
            }
            e @ (SessionError::InvalidConfig(_) | SessionError::ConfigLoadFailed(_)) => {
                ApiError::new(ErrorCode::ConfigError, e.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use routecart_core::{Money, UnitType, ValidationError};

    #[test]
    fn test_core_error_codes() {
        let stock = ApiError::from(CoreError::StockExceeded {
            sku: "WATER-500".to_string(),
            unit_type: UnitType::Second,
            available: 1,
            requested: 2,
        });
        assert_eq!(stock.code, ErrorCode::InsufficientStock);
        assert!(stock.message.contains("WATER-500"));

        let split = ApiError::from(CoreError::InvalidSplitAmount {
            cash_amount: Money::from_cents(6000),
            total: Money::from_cents(5000),
        });
        assert_eq!(split.code, ErrorCode::PaymentError);

        let customer = ApiError::from(CoreError::NoCustomerSelected);
        assert_eq!(customer.code, ErrorCode::CustomerRequired);

        let validation = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "checkNumber".to_string(),
        }));
        assert_eq!(validation.code, ErrorCode::ValidationError);
        assert_eq!(validation.message, "checkNumber is required");
    }

    #[test]
    fn test_backend_errors_hide_internals() {
        let api = ApiError::from(BackendError::InvalidResponse("expected `,` at line 3".to_string()));
        assert_eq!(api.code, ErrorCode::Internal);
        assert!(!api.message.contains("line 3"));

        let api = ApiError::from(SessionError::from(BackendError::Unavailable("timeout".to_string())));
        assert_eq!(api.code, ErrorCode::BackendUnavailable);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::from(CoreError::EmptyCart)).unwrap();
        assert_eq!(json["code"], "CART_ERROR");
        assert_eq!(json["message"], "Cart is empty");
    }
}
