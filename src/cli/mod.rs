// Sealgate — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: keygen, sign, status.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// Sealgate — host-side gateway for enclave-sealed key material.
#[derive(Parser, Debug)]
#[command(name = "sealgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a signing keypair inside the trusted boundary and
    /// persist both sealed halves.
    Keygen {
        /// Destination for the sealed private key.
        #[arg(long)]
        sealed_privkey: Option<PathBuf>,

        /// Destination for the sealed public key.
        #[arg(long)]
        sealed_pubkey: Option<PathBuf>,
    },

    /// Sign a message file with the sealed private key, then seal and
    /// persist the signature.
    Sign {
        /// Path to the file whose contents will be signed.
        #[arg(long)]
        message: PathBuf,

        /// Location of the sealed private key.
        #[arg(long)]
        sealed_privkey: Option<PathBuf>,

        /// Destination for the sealed signature.
        #[arg(long)]
        sealed_signature: Option<PathBuf>,
    },

    /// Report which sealed artifacts exist and their sizes.
    Status {
        /// Location of the sealed private key.
        #[arg(long)]
        sealed_privkey: Option<PathBuf>,

        /// Location of the sealed public key.
        #[arg(long)]
        sealed_pubkey: Option<PathBuf>,

        /// Location of the sealed signature.
        #[arg(long)]
        sealed_signature: Option<PathBuf>,
    },
}
