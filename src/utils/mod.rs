// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod crypto;
pub mod logging;

pub use crypto::CredentialCipher;
