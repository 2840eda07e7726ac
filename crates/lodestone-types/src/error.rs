//! Shared error taxonomy (spec §7).
//!
//! Individual crates define their own `thiserror` enums for the failure
//! modes specific to their layer (`ChainError`, `DbError`, ...); this module
//! holds the cross-cutting [`ErrorCategory`] that the HTTP facade uses to
//! map *any* domain error to a status code through one table, per the
//! "Propagation policy" in spec §7 — no raw DB error is ever allowed to
//! reach a client.

use serde::Serialize;

/// The eight-entry taxonomy from spec §7, independent of which layer raised
/// the error. Every domain error type in the workspace implements
/// [`Categorized`] so the API crate can match on this instead of on
/// per-crate error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Transient RPC failure, already retried and exhausted.
    TransientRpc,
    /// Malformed event payload — logged, skipped, not checkpointed over.
    DecodeSchema,
    /// Unique-key conflict — expected, treated as a no-op.
    UniquenessConflict,
    /// Token has no path to the pricing anchor.
    PriceUnknown,
    /// Inbound transfer did not match any outstanding deposit request.
    DepositMismatch,
    /// Caller is unauthenticated or lacks the required role.
    AuthZ,
    /// Caller exceeded the rate limit.
    RateLimited,
    /// Unexpected internal failure; detail is not shown to the client.
    Internal,
}

pub trait Categorized {
    fn category(&self) -> ErrorCategory;
}

impl ErrorCategory {
    /// Whether this category ever warrants surfacing the Display string
    /// to an external caller. Internal errors get a fixed short reason
    /// instead (spec §7.8: "full stack in server logs only").
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, ErrorCategory::Internal)
    }
}
