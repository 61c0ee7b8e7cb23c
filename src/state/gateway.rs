// Sealgate — Gateway State
//
// The explicit context object for one gateway process: three sealed
// buffer slots plus the last-error register. Every lifecycle operation
// is a method here, and all of them run on the single control thread;
// `&mut self` serializes slot mutation at compile time.
//
// Propagation policy: each operation answers "did this step fully
// succeed" as a bool and recovers locally from I/O faults. The richer
// status code travels only through the last-error register, which save
// and seal operations taint and nothing clears implicitly.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::enclave::{BoundaryStatus, SealingService};
use crate::storage::{self, WriteError};

use super::slots::{LastError, SealedSlot, SlotKind};

pub struct GatewayState {
    private_key: SealedSlot,
    public_key: SealedSlot,
    signature: SealedSlot,
    last_error: LastError,
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            private_key: SealedSlot::empty(),
            public_key: SealedSlot::empty(),
            signature: SealedSlot::empty(),
            last_error: LastError::new(),
        }
    }

    /// Read-only view of a slot.
    pub fn slot(&self, kind: SlotKind) -> &SealedSlot {
        match kind {
            SlotKind::PrivateKey => &self.private_key,
            SlotKind::PublicKey => &self.public_key,
            SlotKind::Signature => &self.signature,
        }
    }

    fn slot_mut(&mut self, kind: SlotKind) -> &mut SealedSlot {
        match kind {
            SlotKind::PrivateKey => &mut self.private_key,
            SlotKind::PublicKey => &mut self.public_key,
            SlotKind::Signature => &mut self.signature,
        }
    }

    /// Most recent boundary-call fault, `Success` if none.
    pub fn last_error(&self) -> BoundaryStatus {
        self.last_error.code()
    }

    /// Reset the register before a retry.
    pub fn clear_last_error(&mut self) {
        self.last_error.clear();
    }

    // ─── Load / Save ─────────────────────────────────────────────────────────

    /// Load a sealed buffer from `source` into the slot.
    ///
    /// The whole file is read into a new buffer first and only then
    /// swapped in, releasing the prior buffer; a failed read leaves the
    /// slot untouched. No boundary call occurs and the last-error
    /// register is not consulted or changed.
    pub fn load_slot(&mut self, kind: SlotKind, source: &Path) -> bool {
        info!("Loading sealed {} from {}", kind, source.display());

        match storage::read_to_buffer(source) {
            Ok(bytes) => {
                debug!("Read {} bytes of sealed {}", bytes.len(), kind);
                self.slot_mut(kind).replace(bytes);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to read sealed {} from {}: {}",
                    kind,
                    source.display(),
                    e
                );
                false
            }
        }
    }

    /// Write the slot's buffer, in full, to `dest`, overwriting any
    /// existing file.
    ///
    /// On any failure the register is set to a boundary-adjacent code
    /// even though no boundary call occurred: an unreliable persisted
    /// artifact is as fatal to the overall operation as a failed
    /// crossing. An empty slot saves as an empty file and succeeds.
    pub fn save_slot(&mut self, kind: SlotKind, dest: &Path) -> bool {
        info!("Saving sealed {} to {}", kind, dest.display());

        match storage::write_buffer(dest, self.slot(kind).bytes()) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save sealed {}: {}", kind, e);
                self.last_error.record(BoundaryStatus::Unexpected);
                false
            }
        }
    }

    /// Save the private-key and public-key slots to their destinations.
    ///
    /// If the first destination cannot even be opened the operation
    /// stops there; a short write is recorded but the second save is
    /// still attempted. The result is the AND of both attempts.
    pub fn save_keypair(&mut self, privkey_dest: &Path, pubkey_dest: &Path) -> bool {
        info!("Saving sealed private key to {}", privkey_dest.display());

        let mut ok = true;
        match storage::write_buffer(privkey_dest, self.private_key.bytes()) {
            Ok(()) => {}
            Err(e @ WriteError::Open(_)) => {
                error!("Failed to save sealed private key: {}", e);
                self.last_error.record(BoundaryStatus::Unexpected);
                return false;
            }
            Err(e) => {
                error!("Sealed private key only partially written: {}", e);
                self.last_error.record(BoundaryStatus::Unexpected);
                ok = false;
            }
        }

        info!("Saving sealed public key to {}", pubkey_dest.display());

        match storage::write_buffer(pubkey_dest, self.public_key.bytes()) {
            Ok(()) => {}
            Err(e @ WriteError::Open(_)) => {
                error!("Failed to save sealed public key: {}", e);
                self.last_error.record(BoundaryStatus::Unexpected);
                return false;
            }
            Err(e) => {
                error!("Sealed public key only partially written: {}", e);
                self.last_error.record(BoundaryStatus::Unexpected);
                ok = false;
            }
        }

        ok
    }

    // ─── Boundary Crossings ──────────────────────────────────────────────────

    /// Generate a fresh keypair inside the trusted boundary and install
    /// both sealed halves into the key slots.
    ///
    /// The register is assigned on every crossing; if dispatch worked
    /// but the trusted operation failed, the inner code overrides it.
    /// Slots are only touched when the call actually dispatched.
    pub fn generate_keypair(&mut self, service: &dyn SealingService) -> bool {
        info!("Calling trusted boundary to generate and seal a keypair");

        let reply = service.generate_sealed_keypair();
        self.last_error.record(reply.dispatch);
        if reply.dispatch.is_success() && !reply.inner.is_success() {
            error!("Trusted keypair generation reported: {}", reply.inner);
            self.last_error.record(reply.inner);
        }

        if reply.dispatch.is_success() {
            self.private_key.replace(reply.sealed_private);
            self.public_key.replace(reply.sealed_public);
        }

        self.last_error.is_clear()
    }

    /// Unseal the stored private key inside the boundary and sign
    /// `message` with it.
    ///
    /// The returned signature is a plaintext buffer the caller owns;
    /// it never enters a slot. `None` means the register now holds the
    /// fault code.
    pub fn sign_message(&mut self, service: &dyn SealingService, message: &[u8]) -> Option<Vec<u8>> {
        info!(
            "Calling trusted boundary to sign message ({} bytes)",
            message.len()
        );

        let reply = service.sign_with_sealed_key(self.private_key.bytes(), message);
        self.last_error.record(reply.dispatch);
        if reply.dispatch.is_success() && !reply.inner.is_success() {
            error!("Trusted signing reported: {}", reply.inner);
            self.last_error.record(reply.inner);
        }

        if self.last_error.is_clear() {
            Some(reply.payload)
        } else {
            None
        }
    }

    /// Seal `signature` inside the trusted boundary, install the output
    /// in the signature slot, and persist the slot to `dest`.
    ///
    /// The trusted side's output replaces the slot whenever the call
    /// dispatched, even if the inner operation reported failure, and
    /// the file is written regardless; callers must judge the result by
    /// the returned status, not by whether a file appeared. Overall
    /// success requires both the save and a clean register.
    pub fn seal_signature_and_save(
        &mut self,
        service: &dyn SealingService,
        signature: &[u8],
        dest: &Path,
    ) -> bool {
        info!("Calling trusted boundary to seal signature");

        let reply = service.seal_signature(self.signature.bytes(), signature);
        self.last_error.record(reply.dispatch);
        if reply.dispatch.is_success() && !reply.inner.is_success() {
            error!("Trusted signature sealing reported: {}", reply.inner);
            self.last_error.record(reply.inner);
        }

        if reply.dispatch.is_success() {
            self.signature.replace(reply.payload);
        }

        let saved = self.save_slot(SlotKind::Signature, dest);
        saved && self.last_error.is_clear()
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enclave::mock::MockSealer;
    use std::fs;
    use tempfile::tempdir;

    fn write_fixture(dir: &Path, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    // ─── Load ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_fills_slot_with_file_bytes() {
        let dir = tempdir().unwrap();
        let path = write_fixture(dir.path(), "sealed.bin", &[0x5a; 256]);

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::PrivateKey, &path));

        let slot = state.slot(SlotKind::PrivateKey);
        assert_eq!(slot.len(), 256);
        assert_eq!(slot.bytes(), &[0x5a; 256][..]);
    }

    #[test]
    fn test_failed_load_leaves_slot_unchanged() {
        let dir = tempdir().unwrap();
        let path = write_fixture(dir.path(), "sealed.bin", b"original content");

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::PublicKey, &path));

        let absent = dir.path().join("absent.bin");
        assert!(!state.load_slot(SlotKind::PublicKey, &absent));

        let slot = state.slot(SlotKind::PublicKey);
        assert_eq!(slot.bytes(), b"original content");
        assert_eq!(slot.len(), 16);
    }

    #[test]
    fn test_failed_load_into_empty_slot_keeps_it_empty() {
        let dir = tempdir().unwrap();
        let mut state = GatewayState::new();

        assert!(!state.load_slot(SlotKind::Signature, &dir.path().join("absent.bin")));
        assert!(state.slot(SlotKind::Signature).is_empty());
    }

    #[test]
    fn test_reload_replaces_old_buffer() {
        let dir = tempdir().unwrap();
        let big = write_fixture(dir.path(), "big.bin", &[1u8; 256]);
        let small = write_fixture(dir.path(), "small.bin", &[2u8; 128]);

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::PrivateKey, &big));
        assert_eq!(state.slot(SlotKind::PrivateKey).len(), 256);

        assert!(state.load_slot(SlotKind::PrivateKey, &small));
        assert_eq!(state.slot(SlotKind::PrivateKey).len(), 128);
        assert_eq!(state.slot(SlotKind::PrivateKey).bytes(), &[2u8; 128][..]);
    }

    #[test]
    fn test_load_never_touches_the_register() {
        let dir = tempdir().unwrap();
        let mut state = GatewayState::new();

        state.load_slot(SlotKind::PrivateKey, &dir.path().join("absent.bin"));
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    // ─── Save ────────────────────────────────────────────────────────────

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let source = write_fixture(dir.path(), "in.bin", &[0xc3; 777]);
        let dest = dir.path().join("out.bin");

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::Signature, &source));
        assert!(state.save_slot(SlotKind::Signature, &dest));

        assert_eq!(fs::read(&dest).unwrap(), fs::read(&source).unwrap());
    }

    #[test]
    fn test_save_empty_slot_writes_empty_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("empty.bin");

        let mut state = GatewayState::new();
        assert!(state.save_slot(SlotKind::PrivateKey, &dest));
        assert_eq!(fs::read(&dest).unwrap().len(), 0);
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    #[test]
    fn test_failed_save_taints_the_register() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("no_such_dir").join("out.bin");

        let mut state = GatewayState::new();
        assert!(!state.save_slot(SlotKind::PrivateKey, &dest));
        assert_eq!(state.last_error(), BoundaryStatus::Unexpected);
    }

    #[test]
    fn test_save_keypair_aborts_when_first_destination_unopenable() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("no_such_dir").join("priv.bin");
        let good = dir.path().join("pub.bin");

        let mut state = GatewayState::new();
        assert!(!state.save_keypair(&bad, &good));

        // Fail-fast: the second save must not have been attempted
        assert!(!good.exists());
        assert_eq!(state.last_error(), BoundaryStatus::Unexpected);
    }

    #[test]
    fn test_save_keypair_first_file_survives_second_failure() {
        let dir = tempdir().unwrap();
        let priv_src = write_fixture(dir.path(), "priv_src.bin", &[0x11; 64]);
        let good = dir.path().join("priv.bin");
        let bad = dir.path().join("no_such_dir").join("pub.bin");

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::PrivateKey, &priv_src));

        assert!(!state.save_keypair(&good, &bad));
        assert_eq!(fs::read(&good).unwrap(), vec![0x11; 64]);
    }

    #[test]
    fn test_save_keypair_writes_both_files() {
        let dir = tempdir().unwrap();
        let priv_src = write_fixture(dir.path(), "priv_src.bin", &[0x11; 64]);
        let pub_src = write_fixture(dir.path(), "pub_src.bin", &[0x22; 48]);
        let priv_dest = dir.path().join("priv.bin");
        let pub_dest = dir.path().join("pub.bin");

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::PrivateKey, &priv_src));
        assert!(state.load_slot(SlotKind::PublicKey, &pub_src));

        assert!(state.save_keypair(&priv_dest, &pub_dest));
        assert_eq!(fs::read(&priv_dest).unwrap(), vec![0x11; 64]);
        assert_eq!(fs::read(&pub_dest).unwrap(), vec![0x22; 48]);
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    // ─── Seal-and-Save Orchestration ─────────────────────────────────────

    #[test]
    fn test_seal_signature_and_save_success() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("sealed_sig.bin");
        let sealer = MockSealer::succeeding(vec![0xee; 90]);

        let mut state = GatewayState::new();
        assert!(state.seal_signature_and_save(&sealer, &[0xab; 64], &dest));

        assert_eq!(state.slot(SlotKind::Signature).bytes(), &[0xee; 90][..]);
        assert_eq!(fs::read(&dest).unwrap(), vec![0xee; 90]);
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    #[test]
    fn test_inner_failure_fails_overall_even_though_file_is_written() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("sealed_sig.bin");
        let sealer = MockSealer::inner_failing(BoundaryStatus::Unexpected, vec![0xdd; 30]);

        let mut state = GatewayState::new();
        assert!(!state.seal_signature_and_save(&sealer, &[0xab; 64], &dest));

        // The degraded output still replaced the slot and still hit disk
        assert_eq!(state.slot(SlotKind::Signature).bytes(), &[0xdd; 30][..]);
        assert_eq!(fs::read(&dest).unwrap(), vec![0xdd; 30]);
        assert_eq!(state.last_error(), BoundaryStatus::Unexpected);
    }

    #[test]
    fn test_inner_failure_preserves_original_code() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("sealed_sig.bin");
        let sealer = MockSealer::inner_failing(BoundaryStatus::OutOfMemory, Vec::new());

        let mut state = GatewayState::new();
        assert!(!state.seal_signature_and_save(&sealer, &[1u8; 64], &dest));
        assert_eq!(state.last_error(), BoundaryStatus::OutOfMemory);
    }

    #[test]
    fn test_undispatched_call_keeps_prior_slot_content() {
        let dir = tempdir().unwrap();
        let prior = write_fixture(dir.path(), "prior.bin", &[0x77; 40]);
        let dest = dir.path().join("sealed_sig.bin");
        let sealer = MockSealer::undispatched(BoundaryStatus::Unavailable);

        let mut state = GatewayState::new();
        assert!(state.load_slot(SlotKind::Signature, &prior));

        assert!(!state.seal_signature_and_save(&sealer, &[1u8; 64], &dest));

        // The crossing never ran, so the slot holds what it held, and
        // that is what was written out.
        assert_eq!(state.slot(SlotKind::Signature).bytes(), &[0x77; 40][..]);
        assert_eq!(fs::read(&dest).unwrap(), vec![0x77; 40]);
        assert_eq!(state.last_error(), BoundaryStatus::Unavailable);
    }

    #[test]
    fn test_successful_crossing_resets_register_for_that_call() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("sealed_sig.bin");

        let mut state = GatewayState::new();
        let failing = MockSealer::inner_failing(BoundaryStatus::MacMismatch, Vec::new());
        assert!(!state.seal_signature_and_save(&failing, &[1u8; 64], &dest));
        assert_eq!(state.last_error(), BoundaryStatus::MacMismatch);

        // A subsequent crossing assigns the register anew
        let succeeding = MockSealer::succeeding(vec![3u8; 10]);
        assert!(state.seal_signature_and_save(&succeeding, &[1u8; 64], &dest));
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    #[test]
    fn test_register_is_sticky_across_saves() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let sealer = MockSealer::inner_failing(BoundaryStatus::Unexpected, Vec::new());

        let mut state = GatewayState::new();
        state.seal_signature_and_save(&sealer, &[1u8; 64], &dir.path().join("sig.bin"));
        assert!(!state.last_error().is_success());

        // A later save succeeds as a step, but the register still holds
        // the earlier fault until explicitly cleared.
        assert!(state.save_slot(SlotKind::PublicKey, &dest));
        assert_eq!(state.last_error(), BoundaryStatus::Unexpected);

        state.clear_last_error();
        assert_eq!(state.last_error(), BoundaryStatus::Success);
    }

    // ─── Keygen / Sign ───────────────────────────────────────────────────

    #[test]
    fn test_generate_keypair_fills_both_key_slots() {
        let sealer = MockSealer::succeeding(vec![0x42; 100]);

        let mut state = GatewayState::new();
        assert!(state.generate_keypair(&sealer));
        assert_eq!(state.slot(SlotKind::PrivateKey).len(), 100);
        assert_eq!(state.slot(SlotKind::PublicKey).len(), 100);
    }

    #[test]
    fn test_generate_keypair_undispatched_leaves_slots_empty() {
        let sealer = MockSealer::undispatched(BoundaryStatus::Unavailable);

        let mut state = GatewayState::new();
        assert!(!state.generate_keypair(&sealer));
        assert!(state.slot(SlotKind::PrivateKey).is_empty());
        assert!(state.slot(SlotKind::PublicKey).is_empty());
        assert_eq!(state.last_error(), BoundaryStatus::Unavailable);
    }

    #[test]
    fn test_sign_message_returns_payload_on_success() {
        let sealer = MockSealer::succeeding(vec![0x99; 64]);

        let mut state = GatewayState::new();
        let signature = state.sign_message(&sealer, b"message");
        assert_eq!(signature, Some(vec![0x99; 64]));
    }

    #[test]
    fn test_sign_message_failure_taints_register_and_returns_none() {
        let sealer = MockSealer::inner_failing(BoundaryStatus::MacMismatch, vec![0x99; 64]);

        let mut state = GatewayState::new();
        assert_eq!(state.sign_message(&sealer, b"message"), None);
        assert_eq!(state.last_error(), BoundaryStatus::MacMismatch);
    }
}
