//! Certificate fingerprint (digest) computation.

use crate::record::HashAlgorithm;
use crate::util;

/// Compute the fingerprint of DER-encoded certificate bytes.
///
/// Returns a colon-separated uppercase hex string (e.g., "AB:CD:EF:..."),
/// or an empty string for digests this crate does not compute (MD5).
pub fn compute_fingerprint(der_bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm.digest(der_bytes) {
        Some(hash_bytes) => util::hex_colon_upper(&hash_bytes),
        None => String::new(),
    }
}
