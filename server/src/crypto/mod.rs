//! Cryptographic building blocks: OpenSSH key primitives and the secret
//! codec used for session and token IDs.

pub mod keygen;
pub mod seal;

// vim: ts=4
