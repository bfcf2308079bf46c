//! Constant-time equality for secret material.

use subtle::ConstantTimeEq;

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Every secret comparison in the gateway goes through this function; `==`
/// on secrets leaks the position of the first differing byte through timing.
/// When the lengths differ the inputs cannot be equal; a self-comparison is
/// still performed so the work done depends only on the input length, which
/// is the one signal that cannot be hidden.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        let _ = a.ct_eq(a);
        return false;
    }
    a.ct_eq(b).into()
}
