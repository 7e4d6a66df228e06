//! Error types for the reconciliation engine.

use thiserror::Error;

/// Engine-level errors.
///
/// Genuineness checks never produce an error for an expected network
/// failure — that is encoded as
/// [`GenuineOutcome::InternetError`](crate::GenuineOutcome::InternetError).
/// Errors here are either fatal contract breaches or typed failures of the
/// non-outcome operations (activation, key handling, trial management).
#[derive(Debug, Error)]
pub enum LicentiaError {
    /// The backend returned a code outside its documented set.
    /// Fatal: reconciliation must abort rather than guess.
    #[error("backend contract violation: {operation} returned unrecognized code {code}")]
    BackendContractViolation {
        /// The backend operation that misbehaved.
        operation: &'static str,
        /// The unrecognized raw status code.
        code: i32,
    },

    /// No handle could be acquired for the product identifier.
    #[error("invalid product identifier or missing product data: {0}")]
    HandleInvalid(String),

    /// Verified-trial integrity check failed (clock rollback or edited trial data).
    #[error("trial data has been tampered with")]
    TrialDataTampered,

    /// The trial period is over.
    #[error("trial period has expired")]
    TrialExpired,

    /// The trial extension code was rejected or already consumed.
    #[error("trial extension code invalid or already used")]
    ExtensionCodeInvalid,

    /// The product key was rejected.
    #[error("product key is not valid for this product")]
    ProductKeyInvalid,

    /// The product key has been revoked by the license authority.
    #[error("product key has been revoked")]
    KeyRevoked,

    /// The operation requires a prior activation.
    #[error("product is not activated")]
    NotActivated,

    /// The backend could not reach the activation servers.
    #[error("could not contact the activation servers")]
    NetworkUnavailable,

    /// A reconciliation policy field is outside its documented bounds.
    #[error("invalid reconciliation policy: {0}")]
    PolicyInvalid(&'static str),
}

/// Result type for engine operations.
pub type LicentiaResult<T> = Result<T, LicentiaError>;
