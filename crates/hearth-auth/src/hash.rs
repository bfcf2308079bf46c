//! Password digest derivation for stored credentials.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Salt baked into every digest. Changing it (or the iteration count)
/// invalidates all previously provisioned digests; the stored format carries
/// no version field, so there is no migration path.
const SALT: [u8; 16] = [
    0x02, 0x4f, 0xc0, 0x50, 0x3f, 0x16, 0xc4, 0xdb, 0xbe, 0x96, 0xba, 0xb4, 0xa9, 0x72, 0x87,
    0xe0,
];

const ITERATIONS: u32 = 100_000;

/// Length in characters of a stored hex digest (SHA-256 output, hex encoded).
pub const DIGEST_HEX_LEN: usize = 64;

/// Derive the stored digest for a plaintext password.
///
/// PBKDF2-HMAC-SHA256 over the static salt, encoded as lowercase hex. The
/// function is deterministic: the same password yields the same digest on
/// every platform, which is what makes offline provisioning possible.
///
/// This is intentionally slow (100k iterations); callers must invoke it at
/// most once per verification attempt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut derived = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &SALT, ITERATIONS, &mut derived);
    hex::encode(derived)
}
