//! Authentication primitives for the Hearth gateway.
//!
//! # Design
//! - Pure, synchronous building blocks: hashing, constant-time comparison,
//!   trusted-network matching, and credential verification.
//! - No IO and no shared mutable state; the resolved identity is returned to
//!   the caller and threaded through the request explicitly.

mod compare;
mod hash;
mod identity;
mod trusted;
mod verifier;

pub use compare::constant_time_eq;
pub use hash::{DIGEST_HEX_LEN, hash_password};
pub use identity::Identity;
pub use trusted::TrustedNetworks;
pub use verifier::{AuthAttempt, CredentialVerifier};
