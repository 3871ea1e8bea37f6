//! Per-certificate policy checks.
//!
//! Every check runs independently and contributes its own flag; nothing
//! short-circuits. The path is subject first, so depth `d` is `path[d]`.

use super::chain::PathCert;
use super::flags::VerifyFlags;
use crate::profile::Profile;
use crate::record::{CertificateRecord, KeyAlgorithm};
use crate::util::verify_hostname_match;

/// Inputs shared by the checks of one verification call.
pub(crate) struct CheckContext<'a> {
    pub profile: &'a Profile,
    pub at_time: i64,
    pub expected_name: Option<&'a str>,
}

/// All built-in certificate checks for the certificate at `depth`.
pub(crate) fn check_certificate(
    path: &[PathCert<'_>],
    depth: usize,
    ctx: &CheckContext<'_>,
) -> VerifyFlags {
    let Some(entry) = path.get(depth) else {
        return VerifyFlags::empty();
    };
    let mut flags = check_time(entry.cert, ctx.at_time);
    // An anchor above the subject is trusted by configuration, not by its
    // signature, so its signing hash does not matter.
    if !(entry.anchor && depth > 0) {
        flags |= check_signature_hash(entry.cert, ctx.profile);
    }
    flags |= check_public_key(entry.cert, ctx.profile);
    flags |= structural_flags(path, depth);
    if depth == 0 {
        if let Some(expected) = ctx.expected_name {
            flags |= check_name(entry.cert, expected);
        }
    }
    flags
}

/// Validity window check; both bounds inclusive.
pub(crate) fn check_time(cert: &CertificateRecord, at_time: i64) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();
    flags.set_if(at_time < cert.validity.not_before, VerifyFlags::NOT_YET_VALID);
    flags.set_if(at_time > cert.validity.not_after, VerifyFlags::EXPIRED);
    flags
}

pub(crate) fn check_signature_hash(cert: &CertificateRecord, profile: &Profile) -> VerifyFlags {
    if profile.allows_signature(cert.signature_algorithm) {
        VerifyFlags::empty()
    } else {
        VerifyFlags::WEAK_HASH
    }
}

/// Key algorithm, curve and RSA modulus size.
pub(crate) fn check_public_key(cert: &CertificateRecord, profile: &Profile) -> VerifyFlags {
    let key = &cert.public_key;
    let mut flags = VerifyFlags::empty();
    match key.algorithm {
        Some(alg) => {
            flags.set_if(!profile.allows_pubkey_alg(alg), VerifyFlags::BAD_PK_ALG);
            match alg {
                KeyAlgorithm::Rsa => {
                    flags.set_if(!profile.meets_min_key_size(key.bits), VerifyFlags::WEAK_KEY);
                }
                KeyAlgorithm::Ec => {
                    let curve_ok = key.curve.is_some_and(|c| profile.allows_curve(c));
                    flags.set_if(!curve_ok, VerifyFlags::BAD_CURVE);
                }
                KeyAlgorithm::Ed25519 => {}
            }
        }
        None => flags |= VerifyFlags::BAD_PK_ALG,
    }
    flags
}

/// Issuer-side structural rules for the certificate at `depth`.
///
/// The subject (depth 0) issues nothing on the path, so it never gets
/// these flags.
pub(crate) fn structural_flags(path: &[PathCert<'_>], depth: usize) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();
    let Some(entry) = path.get(depth) else {
        return flags;
    };
    if depth == 0 {
        return flags;
    }
    let cert = entry.cert;
    flags.set_if(!entry.anchor && !cert.is_ca(), VerifyFlags::NOT_CA);
    flags.set_if(
        cert.key_usage.is_some_and(|ku| !ku.key_cert_sign()),
        VerifyFlags::KEY_USAGE,
    );
    if let Some(limit) = cert.basic_constraints.and_then(|bc| bc.path_len) {
        // RFC 5280 Section 6.1.4: self-issued intermediates are free.
        let below = path
            .iter()
            .take(depth)
            .skip(1)
            .filter(|p| !p.cert.is_self_issued())
            .count();
        flags.set_if(below > limit as usize, VerifyFlags::PATH_LENGTH_EXCEEDED);
    }
    flags
}

/// Union of [`structural_flags`] over the whole path.
pub(crate) fn structural_defects(path: &[PathCert<'_>]) -> VerifyFlags {
    (0..path.len()).fold(VerifyFlags::empty(), |acc, depth| {
        acc | structural_flags(path, depth)
    })
}

pub(crate) fn check_name(cert: &CertificateRecord, expected: &str) -> VerifyFlags {
    if verify_hostname_match(&cert.dns_names, cert.common_name.as_deref(), expected) {
        VerifyFlags::empty()
    } else {
        VerifyFlags::NAME_MISMATCH
    }
}
