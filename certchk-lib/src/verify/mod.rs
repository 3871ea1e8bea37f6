//! Certificate path verification against a trust store.
//!
//! [`verify_certificate_with_options`] builds a path from the subject to a
//! trust anchor, runs every policy check on every certificate of that path
//! (or of the best partial path when no anchor is reachable), consults
//! CRLs, lets an application callback adjust the per-certificate findings,
//! and folds everything into one [`VerificationResult`].
//!
//! A call keeps all working state on its own stack frame. Inputs are only
//! borrowed, so the same subject, pool, store and profile can be verified
//! from many threads at once with identical results.

mod chain;
mod checks;
mod crl;
mod flags;
mod signature;
#[cfg(test)]
pub(crate) mod test_support;
mod trust_store;

use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::Serialize;

use crate::crypto::{RustCryptoVerifier, SignatureVerifier};
use crate::profile::Profile;
use crate::record::{CertificateRecord, CrlRecord};
use crate::CertchkError;

use chain::{build_chain, MAX_CHAIN_DEPTH};
use checks::{check_certificate, CheckContext};
use crl::check_revocation;
use signature::LinkVerifier;

pub use flags::{Status, VerifyFlags};
pub use trust_store::{find_system_ca_bundle, TrustStore};

static DEFAULT_VERIFIER: RustCryptoVerifier = RustCryptoVerifier;

/// Application hook run once per path certificate after the built-in checks.
///
/// Receives the certificate, its depth (0 = subject) and the flags found
/// for it, and returns the flags to keep. Clearing a bit accepts that
/// defect; adding [`VerifyFlags::APPLICATION`] forces failure. Calls are
/// made from the top of the path down to the subject.
pub trait VerifyCallback: Sync {
    fn adjust(&self, cert: &CertificateRecord, depth: usize, flags: VerifyFlags) -> VerifyFlags;
}

impl<F> VerifyCallback for F
where
    F: Fn(&CertificateRecord, usize, VerifyFlags) -> VerifyFlags + Sync,
{
    fn adjust(&self, cert: &CertificateRecord, depth: usize, flags: VerifyFlags) -> VerifyFlags {
        self(cert, depth, flags)
    }
}

/// Options controlling verification behavior.
#[derive(Clone, Copy)]
pub struct VerifyOptions<'a> {
    /// Verify at a specific Unix timestamp instead of the current time.
    /// Matches OpenSSL's `-attime` flag.
    pub at_time: Option<i64>,
    /// Maximum number of certificates on a path, subject and anchor
    /// included. Must be at least 1. Defaults to 32.
    pub max_depth: usize,
    /// Revocation lists to consult.
    pub crls: &'a [CrlRecord],
    /// Host name the subject must match (SAN DNS names, else CN).
    pub expected_name: Option<&'a str>,
    pub callback: Option<&'a dyn VerifyCallback>,
    /// Signature backend. [`RustCryptoVerifier`] when `None`.
    pub verifier: Option<&'a dyn SignatureVerifier>,
}

impl Default for VerifyOptions<'_> {
    fn default() -> Self {
        VerifyOptions {
            at_time: None,
            max_depth: MAX_CHAIN_DEPTH,
            crls: &[],
            expected_name: None,
            callback: None,
            verifier: None,
        }
    }
}

impl std::fmt::Debug for VerifyOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("at_time", &self.at_time)
            .field("max_depth", &self.max_depth)
            .field("crls", &self.crls.len())
            .field("expected_name", &self.expected_name)
            .field("callback", &self.callback.is_some())
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

/// Result of certificate path verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub status: Status,
    /// Union of the flags of every certificate in `chain`.
    pub flags: VerifyFlags,
    /// The path that was evaluated, subject first. When no trust anchor
    /// was reached this is the best partial path.
    pub chain: Vec<ChainCertInfo>,
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        self.status.is_success()
    }
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [short_name], [serial], [OK/FAIL], [optional reasons]
        if let Some(leaf) = self.chain.first() {
            write!(f, "{}, {}, ", leaf.short_name, leaf.serial)?;
        }
        if self.is_valid() {
            write!(f, "OK")
        } else {
            write!(f, "FAIL, {}", self.flags)
        }
    }
}

/// Information about a certificate in the evaluated path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainCertInfo {
    /// Position in the path (0 = subject).
    pub depth: usize,
    pub subject: String,
    pub issuer: String,
    /// CN, or the full subject when there is none.
    pub short_name: String,
    /// Serial number as colon-separated hex.
    pub serial: String,
    /// SHA-256 fingerprint of the DER encoding.
    pub fingerprint: String,
    /// Flags found for this certificate, after the callback.
    pub flags: VerifyFlags,
    pub trust_anchor: bool,
}

/// Verify `subject` against `trust_store` with default options.
///
/// `intermediates` is an untrusted pool of possible issuers in any order.
pub fn verify_certificate(
    subject: &CertificateRecord,
    intermediates: &[CertificateRecord],
    trust_store: &TrustStore,
    profile: &Profile,
) -> Result<VerificationResult, CertchkError> {
    verify_certificate_with_options(
        subject,
        intermediates,
        trust_store,
        profile,
        &VerifyOptions::default(),
    )
}

/// Verify `subject` with configurable options.
///
/// Policy and trust failures are reported in the returned
/// [`VerificationResult`]; `Err` is only returned for invalid options.
pub fn verify_certificate_with_options(
    subject: &CertificateRecord,
    intermediates: &[CertificateRecord],
    trust_store: &TrustStore,
    profile: &Profile,
    options: &VerifyOptions<'_>,
) -> Result<VerificationResult, CertchkError> {
    if options.max_depth == 0 {
        return Err(CertchkError::InvalidOptions(
            "max_depth must be at least 1".into(),
        ));
    }

    let at_time = options.at_time.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    });
    let backend: &dyn SignatureVerifier = options.verifier.unwrap_or(&DEFAULT_VERIFIER);
    let mut links = LinkVerifier::new(backend);

    let built = build_chain(
        subject,
        intermediates,
        trust_store,
        &mut links,
        options.max_depth,
    );

    let ctx = CheckContext {
        profile,
        at_time,
        expected_name: options.expected_name,
    };
    let mut per_cert: Vec<VerifyFlags> = (0..built.path.len())
        .map(|depth| check_certificate(&built.path, depth, &ctx))
        .collect();

    for (depth, pair) in built.path.windows(2).enumerate() {
        if let ([child, issuer], Some(flags)) = (pair, per_cert.get_mut(depth)) {
            *flags |= check_revocation(
                child.cert,
                issuer.cert,
                options.crls,
                links.backend(),
                profile,
                at_time,
            );
        }
    }

    if let Some(top) = per_cert.last_mut() {
        *top |= built.top_flags;
    }

    if let Some(callback) = options.callback {
        for (depth, flags) in per_cert.iter_mut().enumerate().rev() {
            if let Some(entry) = built.path.get(depth) {
                *flags = callback.adjust(entry.cert, depth, *flags);
            }
        }
    }

    let flags = per_cert
        .iter()
        .fold(VerifyFlags::empty(), |acc, f| acc | *f);
    let status = if built.trusted && flags.is_empty() {
        Status::Success
    } else {
        Status::Failure
    };
    debug!(
        "verified '{}': {:?} ({}), path length {}",
        subject.short_name(),
        status,
        flags,
        built.path.len()
    );

    let chain = built
        .path
        .iter()
        .zip(&per_cert)
        .enumerate()
        .map(|(depth, (entry, flags))| ChainCertInfo {
            depth,
            subject: entry.cert.subject.to_string(),
            issuer: entry.cert.issuer.to_string(),
            short_name: entry.cert.short_name(),
            serial: entry.cert.serial_hex(),
            fingerprint: entry.cert.fingerprint(),
            flags: *flags,
            trust_anchor: entry.anchor,
        })
        .collect();

    Ok(VerificationResult {
        status,
        flags,
        chain,
    })
}
