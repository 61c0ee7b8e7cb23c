// Sealgate — Trusted Sealing Service
//
// The gateway never performs cryptography itself: key generation,
// signing, and sealing all happen behind the `SealingService` trait,
// which models a synchronous crossing into a trusted execution context.
// Buffer arguments are borrowed views valid only for the duration of the
// call; the trusted side never retains them.
//
// `SoftwareSealer` is the implementation for hosts without enclave
// hardware. Its sealing identity is a random secret held in the
// platform's native keyring, stretched to an AES-256-GCM key with
// Argon2id. A blob sealed on one host cannot be unsealed on another.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::{BoundaryReply, BoundaryStatus, EnclaveError, KeypairReply};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Service name used to identify Sealgate entries in the platform keyring.
const KEYRING_SERVICE: &str = "sealgate";

/// Username for the keyring entry (identifies the sealing secret).
const KEYRING_USER: &str = "sealing-identity";

/// Length of the randomly generated sealing secret in bytes (256-bit entropy).
const SEALING_SECRET_LEN: usize = 32;

/// Length of the derived AES-256-GCM sealing key in bytes.
const SEALING_KEY_LEN: usize = 32;

/// Length of the Ed25519 private key seed in bytes.
const SEED_LEN: usize = 32;

/// AES-GCM nonce length; every sealed blob starts with one.
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length appended to every ciphertext.
const TAG_LEN: usize = 16;

// Argon2id parameters: strong defaults for a security application.
// m=65536 (64 MiB), t=3 (3 iterations), p=4 (4 parallelism lanes)
const ARGON2_M_COST: u32 = 65536;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the trusted sealing boundary, enabling software and
/// hardware backends and mock implementations for testing.
pub trait SealingService {
    /// Generate a fresh signing keypair inside the trusted boundary and
    /// return both halves sealed to the boundary's identity.
    fn generate_sealed_keypair(&self) -> KeypairReply;

    /// Unseal the private key inside the boundary and sign `message`
    /// with it. The reply payload is the raw (unsealed) signature.
    fn sign_with_sealed_key(&self, sealed_privkey: &[u8], message: &[u8]) -> BoundaryReply;

    /// Seal a freshly produced signature. `sealed_prior` is the current
    /// sealed signature, if any; re-sealing does not depend on it.
    fn seal_signature(&self, sealed_prior: &[u8], signature: &[u8]) -> BoundaryReply;
}

// ─── Software Implementation ─────────────────────────────────────────────────

/// Software sealing backend keyed by a per-host secret.
///
/// Dispatches the keyring lookup to:
///   - Linux: kernel keyutils
///   - macOS: Security.framework Keychain
///   - Windows: Windows Credential Manager
pub struct SoftwareSealer {
    sealing_key: Zeroizing<[u8; SEALING_KEY_LEN]>,
}

impl SoftwareSealer {
    /// Construct the sealer from the platform keyring. On first run,
    /// generates a new random sealing secret and stores it.
    pub fn from_keyring() -> Result<Self, EnclaveError> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
            .map_err(|e| EnclaveError::Keyring(format!("failed to create keyring entry: {}", e)))?;

        let secret = match entry.get_secret() {
            Ok(secret) => {
                tracing::debug!("Retrieved existing sealing secret from keyring");
                Zeroizing::new(secret)
            }
            Err(keyring::Error::NoEntry) => {
                // First run: generate and store a new sealing secret
                tracing::info!("No sealing secret found; generating a new one");
                let mut secret = Zeroizing::new(vec![0u8; SEALING_SECRET_LEN]);
                rand::rng().fill_bytes(&mut secret);
                entry.set_secret(&secret).map_err(|e| {
                    EnclaveError::Keyring(format!("failed to store sealing secret: {}", e))
                })?;
                tracing::info!("Sealing secret stored in platform keyring");
                secret
            }
            Err(e) => {
                return Err(EnclaveError::Keyring(format!(
                    "failed to retrieve sealing secret: {}",
                    e
                )))
            }
        };

        Self::derive(&secret)
    }

    /// Construct the sealer from a known 32-byte sealing key, bypassing
    /// the keyring and derivation (useful for testing isolation).
    pub fn with_sealing_key(key: [u8; SEALING_KEY_LEN]) -> Self {
        Self {
            sealing_key: Zeroizing::new(key),
        }
    }

    /// Stretch the keyring secret into the AES-256-GCM sealing key
    /// using Argon2id with a deterministic service-scoped salt.
    fn derive(secret: &[u8]) -> Result<Self, EnclaveError> {
        let salt = Self::build_salt();

        let params = Params::new(
            ARGON2_M_COST,
            ARGON2_T_COST,
            ARGON2_P_COST,
            Some(SEALING_KEY_LEN),
        )
        .map_err(|e| EnclaveError::Derivation(format!("invalid Argon2 params: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut sealing_key = Zeroizing::new([0u8; SEALING_KEY_LEN]);
        argon2
            .hash_password_into(secret, &salt, sealing_key.as_mut_slice())
            .map_err(|e| EnclaveError::Derivation(format!("Argon2id hash failed: {}", e)))?;

        Ok(Self { sealing_key })
    }

    /// Build the deterministic salt for Argon2id.
    /// Salt = SHA-256(service_name || "::" || user_name)
    /// The same keyring secret always derives the same sealing key, so
    /// blobs sealed before a restart remain unsealable after it.
    fn build_salt() -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(KEYRING_SERVICE.as_bytes());
        hasher.update(b"::");
        hasher.update(KEYRING_USER.as_bytes());
        hasher.finalize().to_vec()
    }

    /// Seal `plaintext` under the host identity. Blob layout: a fresh
    /// random nonce followed by the AEAD ciphertext (tag included).
    fn seal_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, EnclaveError> {
        let cipher = Aes256Gcm::new_from_slice(self.sealing_key.as_slice())
            .map_err(|e| EnclaveError::Seal(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| EnclaveError::Seal(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Unseal a blob produced by `seal_bytes`. Fails authentication if
    /// the blob was sealed by a different identity or has been altered.
    fn unseal_bytes(&self, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, EnclaveError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(EnclaveError::TruncatedBlob {
                expected: NONCE_LEN + TAG_LEN,
                got: sealed.len(),
            });
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new_from_slice(self.sealing_key.as_slice())
            .map_err(|e| EnclaveError::Unseal(e.to_string()))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| {
                EnclaveError::Unseal(
                    "authentication failed; blob sealed by a different identity or corrupted"
                        .to_string(),
                )
            })?;

        Ok(Zeroizing::new(plaintext))
    }
}

/// Map an internal failure to the status code the boundary reports.
fn boundary_status(err: &EnclaveError) -> BoundaryStatus {
    match err {
        EnclaveError::Unseal(_) => BoundaryStatus::MacMismatch,
        EnclaveError::TruncatedBlob { .. } | EnclaveError::InvalidKeyLength { .. } => {
            BoundaryStatus::InvalidParameter
        }
        EnclaveError::Keyring(_) => BoundaryStatus::Unavailable,
        EnclaveError::Derivation(_) | EnclaveError::Seal(_) => BoundaryStatus::Unexpected,
    }
}

/// Reconstruct a signing key from an unsealed 32-byte seed.
fn signing_key_from_seed(seed: &[u8]) -> Result<SigningKey, EnclaveError> {
    let seed: [u8; SEED_LEN] = seed.try_into().map_err(|_| EnclaveError::InvalidKeyLength {
        expected: SEED_LEN,
        got: seed.len(),
    })?;
    Ok(SigningKey::from_bytes(&seed))
}

impl SealingService for SoftwareSealer {
    fn generate_sealed_keypair(&self) -> KeypairReply {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        rand::rng().fill_bytes(seed.as_mut_slice());

        let signing_key = SigningKey::from_bytes(&seed);
        let verifying_key = signing_key.verifying_key();

        let sealed_private = match self.seal_bytes(seed.as_slice()) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("Failed to seal generated private key: {}", e);
                return KeypairReply::failed(boundary_status(&e));
            }
        };

        let sealed_public = match self.seal_bytes(verifying_key.as_bytes()) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::error!("Failed to seal generated public key: {}", e);
                return KeypairReply::failed(boundary_status(&e));
            }
        };

        KeypairReply::succeeded(sealed_private, sealed_public)
    }

    fn sign_with_sealed_key(&self, sealed_privkey: &[u8], message: &[u8]) -> BoundaryReply {
        let seed = match self.unseal_bytes(sealed_privkey) {
            Ok(seed) => seed,
            Err(e) => {
                tracing::error!("Failed to unseal private key: {}", e);
                return BoundaryReply::failed(boundary_status(&e));
            }
        };

        let signing_key = match signing_key_from_seed(&seed) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!("Unsealed private key is unusable: {}", e);
                return BoundaryReply::failed(boundary_status(&e));
            }
        };

        let signature = signing_key.sign(message);
        BoundaryReply::succeeded(signature.to_bytes().to_vec())
    }

    fn seal_signature(&self, sealed_prior: &[u8], signature: &[u8]) -> BoundaryReply {
        if !sealed_prior.is_empty() {
            tracing::debug!(
                "Re-sealing over a prior sealed signature ({} bytes)",
                sealed_prior.len()
            );
        }

        match self.seal_bytes(signature) {
            Ok(blob) => BoundaryReply::succeeded(blob),
            Err(e) => {
                tracing::error!("Failed to seal signature: {}", e);
                BoundaryReply::failed(boundary_status(&e))
            }
        }
    }
}

// ─── Scriptable Mock for Testing ─────────────────────────────────────────────

/// A mock service that returns pre-scripted outcomes.
/// Used by the state-layer tests to exercise the error policy without
/// real cryptography or the platform keyring.
#[cfg(test)]
pub mod mock {
    use super::*;

    pub struct MockSealer {
        dispatch: BoundaryStatus,
        inner: BoundaryStatus,
        payload: Vec<u8>,
    }

    impl MockSealer {
        /// Every call succeeds and returns `payload`.
        pub fn succeeding(payload: Vec<u8>) -> Self {
            Self {
                dispatch: BoundaryStatus::Success,
                inner: BoundaryStatus::Success,
                payload,
            }
        }

        /// Calls dispatch, but the trusted operation reports `inner`
        /// and leaves `degraded` in the output buffer.
        pub fn inner_failing(inner: BoundaryStatus, degraded: Vec<u8>) -> Self {
            Self {
                dispatch: BoundaryStatus::Success,
                inner,
                payload: degraded,
            }
        }

        /// Calls never reach the trusted side.
        pub fn undispatched(dispatch: BoundaryStatus) -> Self {
            Self {
                dispatch,
                inner: BoundaryStatus::Unexpected,
                payload: Vec::new(),
            }
        }

        fn reply(&self) -> BoundaryReply {
            BoundaryReply {
                dispatch: self.dispatch,
                inner: self.inner,
                payload: self.payload.clone(),
            }
        }
    }

    impl SealingService for MockSealer {
        fn generate_sealed_keypair(&self) -> KeypairReply {
            KeypairReply {
                dispatch: self.dispatch,
                inner: self.inner,
                sealed_private: self.payload.clone(),
                sealed_public: self.payload.clone(),
            }
        }

        fn sign_with_sealed_key(&self, _sealed_privkey: &[u8], _message: &[u8]) -> BoundaryReply {
            self.reply()
        }

        fn seal_signature(&self, _sealed_prior: &[u8], _signature: &[u8]) -> BoundaryReply {
            self.reply()
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
