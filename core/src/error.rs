use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed input: bad threshold band, unknown agent name, negative stock.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A well-formed request the current state does not allow.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The row exists but its version moved on. Re-read and retry.
    #[error("Concurrency conflict on {entity} '{id}': expected version {expected}")]
    ConcurrencyConflict {
        entity: &'static str,
        id: String,
        expected: i64,
    },

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RiskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    /// Only optimistic-concurrency conflicts are worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

pub type RiskResult<T> = Result<T, RiskError>;
