// Sealgate — CLI Command Handlers
//
// Each function handles one CLI subcommand. They coordinate between the
// enclave (sealing service) and state (sealed buffer slots) modules,
// converting the lifecycle operations' boolean results plus the
// last-error register into process exit status.

use std::fs;
use std::path::PathBuf;

use crate::enclave::SoftwareSealer;
use crate::error::SealgateError;
use crate::state::{GatewayState, SlotKind};

use super::Commands;

/// Default directory for Sealgate data files.
fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("sealgate")
}

fn default_privkey_path() -> PathBuf {
    data_dir().join("sealed_privkey.bin")
}

fn default_pubkey_path() -> PathBuf {
    data_dir().join("sealed_pubkey.bin")
}

fn default_signature_path() -> PathBuf {
    data_dir().join("sealed_signature.bin")
}

/// Execute the parsed CLI command.
pub fn execute(command: Commands) -> Result<(), SealgateError> {
    match command {
        Commands::Keygen {
            sealed_privkey,
            sealed_pubkey,
        } => cmd_keygen(sealed_privkey, sealed_pubkey),
        Commands::Sign {
            message,
            sealed_privkey,
            sealed_signature,
        } => cmd_sign(message, sealed_privkey, sealed_signature),
        Commands::Status {
            sealed_privkey,
            sealed_pubkey,
            sealed_signature,
        } => cmd_status(sealed_privkey, sealed_pubkey, sealed_signature),
    }
}

// ─── Keygen ──────────────────────────────────────────────────────────────────

fn cmd_keygen(
    privkey_dest: Option<PathBuf>,
    pubkey_dest: Option<PathBuf>,
) -> Result<(), SealgateError> {
    let privkey_dest = privkey_dest.unwrap_or_else(default_privkey_path);
    let pubkey_dest = pubkey_dest.unwrap_or_else(default_pubkey_path);
    ensure_parent_dirs(&privkey_dest)?;
    ensure_parent_dirs(&pubkey_dest)?;

    let sealer = SoftwareSealer::from_keyring()?;
    let mut state = GatewayState::new();

    if !state.generate_keypair(&sealer) {
        return Err(SealgateError::Other(format!(
            "Keypair generation failed (boundary status: {})",
            state.last_error()
        )));
    }

    if !state.save_keypair(&privkey_dest, &pubkey_dest) {
        return Err(SealgateError::Other(format!(
            "Sealed keypair not fully persisted (boundary status: {})",
            state.last_error()
        )));
    }

    println!("✓ Keypair generated and sealed");
    println!("  Sealed private key: {}", privkey_dest.display());
    println!("  Sealed public key:  {}", pubkey_dest.display());

    Ok(())
}

// ─── Sign ────────────────────────────────────────────────────────────────────

fn cmd_sign(
    message_path: PathBuf,
    privkey_source: Option<PathBuf>,
    signature_dest: Option<PathBuf>,
) -> Result<(), SealgateError> {
    let privkey_source = privkey_source.unwrap_or_else(default_privkey_path);
    let signature_dest = signature_dest.unwrap_or_else(default_signature_path);
    ensure_parent_dirs(&signature_dest)?;

    let sealer = SoftwareSealer::from_keyring()?;
    let mut state = GatewayState::new();

    if !state.load_slot(SlotKind::PrivateKey, &privkey_source) {
        return Err(SealgateError::Other(format!(
            "No sealed private key at {}. Run `sealgate keygen` first.",
            privkey_source.display()
        )));
    }

    // A previously sealed signature is optional; its presence only
    // feeds the re-seal call.
    if signature_dest.exists() {
        state.load_slot(SlotKind::Signature, &signature_dest);
    }

    let message = fs::read(&message_path)?;

    let signature = state.sign_message(&sealer, &message).ok_or_else(|| {
        SealgateError::Other(format!(
            "Signing failed (boundary status: {})",
            state.last_error()
        ))
    })?;

    if !state.seal_signature_and_save(&sealer, &signature, &signature_dest) {
        return Err(SealgateError::Other(format!(
            "Sealed signature not fully persisted (boundary status: {})",
            state.last_error()
        )));
    }

    println!("✓ Message signed and signature sealed");
    println!("  Message:          {} ({} bytes)", message_path.display(), message.len());
    println!("  Sealed signature: {}", signature_dest.display());

    Ok(())
}

// ─── Status ──────────────────────────────────────────────────────────────────

fn cmd_status(
    privkey_source: Option<PathBuf>,
    pubkey_source: Option<PathBuf>,
    signature_source: Option<PathBuf>,
) -> Result<(), SealgateError> {
    let privkey_source = privkey_source.unwrap_or_else(default_privkey_path);
    let pubkey_source = pubkey_source.unwrap_or_else(default_pubkey_path);
    let signature_source = signature_source.unwrap_or_else(default_signature_path);

    let mut state = GatewayState::new();

    println!("Sealed artifacts:");
    for (kind, path) in [
        (SlotKind::PrivateKey, &privkey_source),
        (SlotKind::PublicKey, &pubkey_source),
        (SlotKind::Signature, &signature_source),
    ] {
        if state.load_slot(kind, path) {
            println!(
                "  {:12} {} ({} bytes)",
                format!("{}:", kind),
                path.display(),
                state.slot(kind).len()
            );
        } else {
            println!("  {:12} {} (not present)", format!("{}:", kind), path.display());
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Create the destination's parent directory if it does not exist yet.
fn ensure_parent_dirs(path: &std::path::Path) -> Result<(), SealgateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
