use super::store::StoreError;

/// Failure taxonomy shared by every marketplace workflow operation.
///
/// Expected business failures are mapped at the call site; only
/// [`WorkflowError::Store`] reaches callers as an infrastructure fault.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A referenced entity is absent.
    #[error("{0} does not exist")]
    NotFound(&'static str),

    /// A uniqueness or idempotency violation.
    #[error("{0}")]
    Conflict(String),

    /// The requested transition is invalid for the current state.
    #[error("{0}")]
    BadRequest(String),

    /// The invitation token failed validation. Deliberately carries no
    /// detail about which check failed.
    #[error("invalid invite")]
    InvalidInvite,

    /// The listing has already been awarded. Not retryable.
    #[error("listing already awarded")]
    AlreadyAwarded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}
