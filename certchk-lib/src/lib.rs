//! certchk-lib: reentrant X.509 certificate path verification.
//!
//! Builds a path from a subject certificate to a trust anchor, evaluates
//! every certificate on it against a cryptographic [`Profile`] and
//! temporal/structural rules, and reports every defect found as an additive
//! [`VerifyFlags`] set instead of stopping at the first failure.
//!
//! Verification keeps no state between calls. Records, trust stores and
//! profiles are borrowed read-only, so one set of inputs can be verified
//! from any number of threads at once.

pub mod checksum;
mod crypto;
mod fingerprint;
mod oid;
mod parser;
mod profile;
mod record;
mod util;
pub mod verify;

pub use crypto::{RustCryptoVerifier, SignatureVerifier};
pub use fingerprint::compute_fingerprint;
pub use parser::{parse_cert, parse_der, parse_der_crl, parse_pem, parse_pem_chain, parse_pem_crls};
pub use profile::{Profile, ProfileConfig};
pub use util::is_pem;
pub use record::{
    BasicConstraints, CertificateRecord, CrlRecord, Curve, HashAlgorithm, KeyAlgorithm, KeyUsage,
    Name, PublicKeyInfo, RevokedEntry, SignatureAlgorithm, Validity,
};
pub use verify::{
    find_system_ca_bundle, verify_certificate, verify_certificate_with_options, ChainCertInfo,
    Status, TrustStore, VerificationResult, VerifyCallback, VerifyFlags, VerifyOptions,
};

/// Errors returned by certchk-lib.
///
/// Policy and trust failures are never errors; they are reported through
/// [`VerificationResult`]. These variants cover malformed input and caller
/// contract violations.
#[derive(Debug, thiserror::Error)]
pub enum CertchkError {
    #[error("Failed to parse certificate: {0}")]
    ParseError(String),

    #[error("Invalid PEM format: {0}")]
    PemError(String),

    #[error("Invalid DER format: {0}")]
    DerError(String),

    #[error("Invalid profile: {0}")]
    ProfileError(String),

    #[error("Invalid verification options: {0}")]
    InvalidOptions(String),

    #[error("Verification error: {0}")]
    VerifyError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
