// Sealgate — Boundary status codes and reply types
//
// The trusted boundary reports two independent results for every call:
// whether the call reached the trusted side at all (dispatch), and, if it
// did, whether the trusted operation itself succeeded (inner). Both are
// expressed in the same status vocabulary, which is also what the
// gateway's last-error register stores.

use std::fmt;

// ─── Status Codes ────────────────────────────────────────────────────────────

/// Status vocabulary of the trusted boundary.
///
/// `Success` is the default register value; everything else records a
/// fault. The set is deliberately small: the gateway never interprets
/// these beyond success/failure, it only stores and reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryStatus {
    /// The call dispatched and the trusted operation completed.
    Success,
    /// Generic fault inside the trusted operation.
    Unexpected,
    /// A buffer argument was malformed or of the wrong length.
    InvalidParameter,
    /// The trusted side could not allocate working memory.
    OutOfMemory,
    /// Unsealing failed authentication: the blob was sealed by a
    /// different identity or has been corrupted.
    MacMismatch,
    /// The trusted execution context could not be reached at all.
    Unavailable,
}

impl BoundaryStatus {
    pub fn is_success(self) -> bool {
        matches!(self, BoundaryStatus::Success)
    }
}

impl fmt::Display for BoundaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BoundaryStatus::Success => "success",
            BoundaryStatus::Unexpected => "unexpected failure",
            BoundaryStatus::InvalidParameter => "invalid parameter",
            BoundaryStatus::OutOfMemory => "out of memory",
            BoundaryStatus::MacMismatch => "seal authentication mismatch",
            BoundaryStatus::Unavailable => "trusted boundary unavailable",
        };
        write!(f, "{}", text)
    }
}

// ─── Reply Types ─────────────────────────────────────────────────────────────

/// Outcome of one boundary crossing that produces a single output buffer.
///
/// `payload` is owned by the caller once the reply is returned; the
/// trusted side retains nothing. On an inner failure the payload may
/// still carry a degraded result, which the caller is free to keep or
/// discard based on the status pair.
#[derive(Debug, Clone)]
pub struct BoundaryReply {
    /// Whether the call reached the trusted side at all.
    pub dispatch: BoundaryStatus,
    /// Status reported by the trusted operation, if dispatched.
    pub inner: BoundaryStatus,
    /// Output buffer produced by the trusted side.
    pub payload: Vec<u8>,
}

impl BoundaryReply {
    pub fn succeeded(payload: Vec<u8>) -> Self {
        Self {
            dispatch: BoundaryStatus::Success,
            inner: BoundaryStatus::Success,
            payload,
        }
    }

    /// The call dispatched but the trusted operation reported `inner`.
    pub fn failed(inner: BoundaryStatus) -> Self {
        Self {
            dispatch: BoundaryStatus::Success,
            inner,
            payload: Vec::new(),
        }
    }

    /// The call never reached the trusted side. The inner status is
    /// initialized to `Unexpected`, matching what a caller would see
    /// from an out-parameter the trusted side never wrote.
    pub fn undispatched(dispatch: BoundaryStatus) -> Self {
        Self {
            dispatch,
            inner: BoundaryStatus::Unexpected,
            payload: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.dispatch.is_success() && self.inner.is_success()
    }
}

/// Outcome of the keypair-generating crossing, which returns both halves
/// of a fresh keypair sealed to the boundary's identity.
#[derive(Debug, Clone)]
pub struct KeypairReply {
    pub dispatch: BoundaryStatus,
    pub inner: BoundaryStatus,
    pub sealed_private: Vec<u8>,
    pub sealed_public: Vec<u8>,
}

impl KeypairReply {
    pub fn succeeded(sealed_private: Vec<u8>, sealed_public: Vec<u8>) -> Self {
        Self {
            dispatch: BoundaryStatus::Success,
            inner: BoundaryStatus::Success,
            sealed_private,
            sealed_public,
        }
    }

    pub fn failed(inner: BoundaryStatus) -> Self {
        Self {
            dispatch: BoundaryStatus::Success,
            inner,
            sealed_private: Vec::new(),
            sealed_public: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.dispatch.is_success() && self.inner.is_success()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
