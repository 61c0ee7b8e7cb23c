// Sealgate — Sealed Buffer Slots
//
// Each slot owns at most one live buffer of sealed material. Replacing
// a slot's content drops the prior buffer in the same assignment, so
// there is no window in which the slot is observably empty and no path
// on which the old buffer leaks. An empty buffer IS the empty slot:
// the "no data" and "zero size" states cannot diverge.

use std::fmt;

use crate::enclave::BoundaryStatus;

/// The categories of sealed material the gateway tracks, one slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    PrivateKey,
    PublicKey,
    Signature,
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SlotKind::PrivateKey => "private key",
            SlotKind::PublicKey => "public key",
            SlotKind::Signature => "signature",
        };
        write!(f, "{}", text)
    }
}

/// One owned sealed buffer. The slot is the buffer's only owner; the
/// raw bytes handed to the sealing service are borrowed views valid
/// only for the duration of that call.
#[derive(Debug, Default)]
pub struct SealedSlot {
    data: Vec<u8>,
}

impl SealedSlot {
    pub const fn empty() -> Self {
        Self { data: Vec::new() }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Install a new buffer, releasing the prior one in the same move.
    pub fn replace(&mut self, bytes: Vec<u8>) {
        self.data = bytes;
    }
}

/// Process-wide register of the most recent boundary-call fault.
///
/// The register is sticky: save and seal operations only ever write
/// failure codes into it, and nothing clears it implicitly, so a caller
/// checking it after a sequence of steps still sees a fault recorded
/// several steps earlier. Boundary crossings assign it on every call;
/// callers that retry decide for themselves when to `clear` it.
#[derive(Debug)]
pub struct LastError {
    code: BoundaryStatus,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            code: BoundaryStatus::Success,
        }
    }

    pub fn record(&mut self, code: BoundaryStatus) {
        self.code = code;
    }

    pub fn code(&self) -> BoundaryStatus {
        self.code
    }

    pub fn is_clear(&self) -> bool {
        self.code.is_success()
    }

    pub fn clear(&mut self) {
        self.code = BoundaryStatus::Success;
    }
}

impl Default for LastError {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
