//! CRL-based revocation checking.
//!
//! A certificate is checked against every CRL issued under its direct
//! issuer's name. The CRL must verify under the issuer's key before its
//! entries are believed; staleness and hash strength only raise flags.

use log::{debug, trace};

use super::flags::VerifyFlags;
use super::signature::verify_signed_content;
use crate::crypto::SignatureVerifier;
use crate::profile::Profile;
use crate::record::{CertificateRecord, CrlRecord};

/// Revocation flags for `cert`, whose issuer on the path is `issuer`.
pub(crate) fn check_revocation(
    cert: &CertificateRecord,
    issuer: &CertificateRecord,
    crls: &[CrlRecord],
    backend: &dyn SignatureVerifier,
    profile: &Profile,
    at_time: i64,
) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();
    for crl in crls.iter().filter(|c| c.issuer.raw == issuer.subject.raw) {
        let crl_flags = check_crl(crl, issuer, backend, profile, at_time);
        flags |= crl_flags;
        if crl_flags.contains(VerifyFlags::CRL_NOT_TRUSTED) {
            continue;
        }
        // RFC 5280 Section 5.3.2: an entry dated in the future is not yet
        // in effect.
        if let Some(entry) = crl.find(&cert.serial) {
            if entry.revocation_date <= at_time {
                debug!(
                    "'{}' (serial {}) revoked by CRL from '{}'",
                    cert.short_name(),
                    cert.serial_hex(),
                    issuer.short_name()
                );
                flags |= VerifyFlags::REVOKED;
            }
        }
    }
    flags
}

/// Flags describing the CRL itself.
fn check_crl(
    crl: &CrlRecord,
    issuer: &CertificateRecord,
    backend: &dyn SignatureVerifier,
    profile: &Profile,
    at_time: i64,
) -> VerifyFlags {
    let mut flags = VerifyFlags::empty();

    let may_sign_crls = issuer.key_usage.map_or(true, |ku| ku.crl_sign());
    let signed = verify_signed_content(
        backend,
        &crl.tbs,
        &crl.signature,
        crl.signature_algorithm,
        &issuer.public_key,
    );
    if !may_sign_crls || !signed {
        trace!(
            "ignoring CRL from '{}': {}",
            issuer.short_name(),
            if signed { "issuer lacks cRLSign" } else { "bad signature" }
        );
        return VerifyFlags::CRL_NOT_TRUSTED;
    }

    flags.set_if(
        !profile.allows_signature(crl.signature_algorithm),
        VerifyFlags::CRL_WEAK_HASH,
    );
    flags.set_if(crl.this_update > at_time, VerifyFlags::CRL_FUTURE);
    flags.set_if(
        crl.next_update.is_some_and(|next| next < at_time),
        VerifyFlags::CRL_EXPIRED,
    );
    flags
}
