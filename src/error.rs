//! Error types for Lightkeeper.

use axum::http::StatusCode;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    #[error("Seller request error: {0}")]
    Seller(#[from] SellerRequestError),
}

/// Configuration-related errors. Always fatal at start-up.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the hosted backend (auth + storage service).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Row not found: {table} with id {id}")]
    NotFound { table: String, id: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Authentication errors surfaced by sign-in.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Sign-in failed: {0}")]
    Backend(#[from] BackendError),
}

/// Buyer preference wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Unknown {category} option: {tag}")]
    UnknownTag { category: String, tag: String },

    #[error("Invalid choice for {field}: {value}")]
    InvalidChoice { field: String, value: String },

    #[error("Invalid number for {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Submit is disabled: {reason}")]
    SubmitDisabled { reason: String },

    #[error("Preferences were already submitted")]
    AlreadySubmitted,

    #[error("A submission is already in progress")]
    SubmitInProgress,

    #[error("Wizard {id} not found")]
    NotFound { id: String },

    #[error("There was an error submitting your preferences. Please try again.")]
    SubmitFailed(#[source] BackendError),
}

/// Property listing errors.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Property {id} not found")]
    NotFound { id: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: String, value: String },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Seller lead form errors.
#[derive(Debug, thiserror::Error)]
pub enum SellerRequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid request type: {0}")]
    InvalidRequestType(String),

    #[error("There was an error submitting your request. Please try again or call us directly at (910) 363-6147.")]
    SubmitFailed(#[source] BackendError),
}

impl Error {
    /// HTTP status for this error when it reaches the API surface.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(BackendError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::Backend(_)) => StatusCode::BAD_GATEWAY,
            Self::Wizard(WizardError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Wizard(WizardError::SubmitFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Wizard(WizardError::SubmitInProgress) => StatusCode::CONFLICT,
            Self::Wizard(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Listing(ListingError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Listing(ListingError::Backend(_)) => StatusCode::BAD_GATEWAY,
            Self::Listing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Seller(SellerRequestError::SubmitFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::Seller(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message without the category prefix, for API bodies.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => e.to_string(),
            Self::Backend(e) => e.to_string(),
            Self::Auth(e) => e.to_string(),
            Self::Wizard(e) => e.to_string(),
            Self::Listing(e) => e.to_string(),
            Self::Seller(e) => e.to_string(),
        }
    }
}

/// Result type alias for Lightkeeper.
pub type Result<T> = std::result::Result<T, Error>;
