//! Link signature checks on top of the pluggable [`SignatureVerifier`].

use std::collections::HashMap;

use log::trace;

use crate::crypto::SignatureVerifier;
use crate::record::{CertificateRecord, PublicKeyInfo, SignatureAlgorithm};

/// Hash `tbs` with the declared algorithm and hand the digest to `backend`.
/// Ed25519 signs the message itself, so its `tbs` is passed through as is.
///
/// An unrecognized or uncomputable hash makes the content unverifiable.
pub(crate) fn verify_signed_content(
    backend: &dyn SignatureVerifier,
    tbs: &[u8],
    signature: &[u8],
    algorithm: SignatureAlgorithm,
    issuer_key: &PublicKeyInfo,
) -> bool {
    if algorithm.signs_raw_message() {
        return backend.verify_signature(tbs, signature, issuer_key, algorithm);
    }
    let Some(hash) = algorithm.hash else {
        return false;
    };
    let Some(digest) = hash.digest(tbs) else {
        return false;
    };
    backend.verify_signature(&digest, signature, issuer_key, algorithm)
}

/// Per-call link checker.
///
/// Results are cached by (child, parent) arena index, so a link shared by
/// several candidate paths is only checked once. The cache lives and dies
/// with one verification call.
pub(crate) struct LinkVerifier<'a> {
    backend: &'a dyn SignatureVerifier,
    memo: HashMap<(usize, usize), bool>,
}

impl<'a> LinkVerifier<'a> {
    pub(crate) fn new(backend: &'a dyn SignatureVerifier) -> Self {
        LinkVerifier {
            backend,
            memo: HashMap::new(),
        }
    }

    pub(crate) fn backend(&self) -> &'a dyn SignatureVerifier {
        self.backend
    }

    /// Whether `parent`'s key verifies `child`'s signature.
    pub(crate) fn verify(
        &mut self,
        child_idx: usize,
        child: &CertificateRecord,
        parent_idx: usize,
        parent: &CertificateRecord,
    ) -> bool {
        if let Some(ok) = self.memo.get(&(child_idx, parent_idx)) {
            return *ok;
        }
        let ok = verify_signed_content(
            self.backend,
            &child.tbs,
            &child.signature,
            child.signature_algorithm,
            &parent.public_key,
        );
        trace!(
            "signature of '{}' under key of '{}': {}",
            child.short_name(),
            parent.short_name(),
            if ok { "ok" } else { "bad" }
        );
        self.memo.insert((child_idx, parent_idx), ok);
        ok
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.memo.len()
    }
}
