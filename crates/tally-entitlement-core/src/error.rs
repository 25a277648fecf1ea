//! Entitlement errors

use tally_types::ActivationErrorKind;
use thiserror::Error;

/// Entitlement errors
#[derive(Error, Debug)]
pub enum EntitlementError {
    /// Account not found
    #[error("account not found")]
    AccountNotFound,

    /// No redeemable code with that identifier
    #[error("code not found")]
    CodeNotFound,

    /// Code already burned by an earlier activation
    #[error("code already used")]
    CodeAlreadyUsed,

    /// Code expired before redemption
    #[error("code expired")]
    CodeExpired,

    /// Webhook signature verification failed
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Webhook payload was malformed or missing required fields
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Free-tier limit reached; caller must upgrade
    #[error("free tier limited to {limit} active habits")]
    UpgradeRequired {
        /// The free-tier cap that was hit
        limit: i64,
    },

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] tally_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl EntitlementError {
    /// The activation-RPC rejection kind for this error, if it has one.
    ///
    /// Activation rejections are part of the RPC contract and reported in
    /// the response body rather than as transport failures.
    pub fn activation_kind(&self) -> Option<ActivationErrorKind> {
        match self {
            Self::CodeNotFound => Some(ActivationErrorKind::CodeNotFound),
            Self::CodeAlreadyUsed => Some(ActivationErrorKind::CodeAlreadyUsed),
            Self::CodeExpired => Some(ActivationErrorKind::CodeExpired),
            _ => None,
        }
    }
}
