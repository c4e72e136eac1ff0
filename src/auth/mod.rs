//! Token authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → extractor.rs (header → query → param → cookie, first hit wins)
//!     → jwt.rs (algorithm check → key lookup → signature + time claims)
//!     → Claims<C> in Ctx locals → protected handler
//!       or error continuation (400 missing / 401 invalid)
//! ```

pub mod extractor;
pub mod jwt;

pub use extractor::{extract_credential, parse_token_lookup, Extractor};
pub use jwt::{signing_algorithm, Claims, ErrorHandler, JwtAuth, JwtConfig, KeySet, SuccessHandler};

/// Authentication failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No source in the extraction chain produced a token.
    #[error("missing or malformed JWT")]
    MissingCredential,

    #[error("invalid or expired JWT: {0}")]
    Verification(String),

    #[error("invalid token lookup {0:?}, expected source:name[,source:name]")]
    InvalidLookup(String),

    #[error("unsupported signing method {0:?}")]
    UnsupportedAlgorithm(String),

    /// Settings name neither `signing_key` nor `signing_keys`.
    #[error("no signing key configured")]
    MissingKey,
}
