//! Common error types for the Muse harness
//!
//! Constraint failures reported by the store carry a PostgreSQL SQLSTATE
//! code; the two codes the check suite branches on are declared here as
//! constants. Any other code is surfaced unchanged and treated as a
//! harness defect, not a pass/fail signal.

use thiserror::Error;

/// SQLSTATE for a CHECK constraint rejection (e.g. enum membership, URL syntax)
pub const SQLSTATE_CHECK_VIOLATION: &str = "23514";

/// SQLSTATE for a UNIQUE constraint rejection
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

/// Common result type for harness operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which declared constraint a violation code maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// CHECK constraint breach (SQLSTATE 23514)
    Check,
    /// UNIQUE constraint breach (SQLSTATE 23505)
    Unique,
    /// Any other SQLSTATE; never a pass/fail signal
    Other,
}

impl ViolationKind {
    /// Map a SQLSTATE code to the kinds the suite distinguishes
    pub fn from_code(code: &str) -> Self {
        match code {
            SQLSTATE_CHECK_VIOLATION => Self::Check,
            SQLSTATE_UNIQUE_VIOLATION => Self::Unique,
            _ => Self::Other,
        }
    }
}

/// Error taxonomy for the harness
#[derive(Error, Debug)]
pub enum Error {
    /// Store rejected a write with a SQLSTATE-coded fault
    #[error("constraint violation (SQLSTATE {code}): {detail}")]
    Constraint {
        kind: ViolationKind,
        code: String,
        detail: String,
    },

    /// Non-2xx store response with no recognizable SQLSTATE
    #[error("store API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Transport failure (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Row (de)serialization failure at the adapter boundary
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Authentication failure or missing credentials (fatal setup error)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A check assertion failed; recorded per check, suite continues
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl Error {
    /// Build a `Constraint` from a raw SQLSTATE code and detail text
    pub fn constraint(code: impl Into<String>, detail: impl Into<String>) -> Self {
        let code = code.into();
        Self::Constraint {
            kind: ViolationKind::from_code(&code),
            code,
            detail: detail.into(),
        }
    }

    /// True if this is a uniqueness violation (SQLSTATE 23505)
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Constraint {
                kind: ViolationKind::Unique,
                ..
            }
        )
    }
}

/// Classify a failed store response body.
///
/// PostgREST reports faults as `{"code": "...", "message": "...",
/// "details": "..."}`. A string `code` field makes this a
/// `Constraint`; anything else is propagated as an `Api` error.
pub fn classify_store_fault(status: u16, body: &str) -> Error {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(code) = parsed.get("code").and_then(|c| c.as_str()) {
            let detail = parsed
                .get("message")
                .or_else(|| parsed.get("details"))
                .and_then(|m| m.as_str())
                .unwrap_or(body);
            return Error::constraint(code, detail);
        }
    }
    Error::Api {
        status,
        body: body.to_string(),
    }
}
