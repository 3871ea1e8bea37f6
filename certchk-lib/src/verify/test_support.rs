//! Synthetic records and a deterministic signature backend for unit tests.

use crate::crypto::SignatureVerifier;
use crate::record::{
    BasicConstraints, CertificateRecord, Curve, HashAlgorithm, KeyAlgorithm, KeyUsage, Name,
    PublicKeyInfo, SignatureAlgorithm, Validity,
};

/// Reference time used by every fixture.
pub(crate) const NOW: i64 = 1_700_000_000;
pub(crate) const DAY: i64 = 86_400;

/// A "signature" is the signer's key bytes followed by the message digest.
pub(crate) struct FakeVerifier;

impl SignatureVerifier for FakeVerifier {
    fn verify_signature(
        &self,
        message_hash: &[u8],
        signature: &[u8],
        public_key: &PublicKeyInfo,
        _algorithm: SignatureAlgorithm,
    ) -> bool {
        signature.len() == public_key.data.len() + message_hash.len()
            && signature.starts_with(&public_key.data)
            && signature.ends_with(message_hash)
    }
}

pub(crate) fn name(cn: &str) -> Name {
    Name::new(format!("CN={}", cn).into_bytes(), format!("CN = {}", cn))
}

/// Unsigned end-entity record valid for a day either side of [`NOW`].
pub(crate) fn record(subject: &str, issuer: &str) -> CertificateRecord {
    CertificateRecord {
        subject: name(subject),
        issuer: name(issuer),
        serial: subject.bytes().take(8).collect(),
        validity: Validity {
            not_before: NOW - DAY,
            not_after: NOW + DAY,
        },
        public_key: PublicKeyInfo {
            algorithm: Some(KeyAlgorithm::Ec),
            curve: Some(Curve::P256),
            bits: 256,
            data: format!("key:{}", subject).into_bytes(),
        },
        signature_algorithm: SignatureAlgorithm::new(KeyAlgorithm::Ec, HashAlgorithm::Sha256),
        common_name: Some(subject.to_string()),
        ..Default::default()
    }
}

/// Unsigned CA record with keyCertSign and cRLSign.
pub(crate) fn ca(subject: &str, issuer: &str) -> CertificateRecord {
    CertificateRecord {
        basic_constraints: Some(BasicConstraints {
            ca: true,
            path_len: None,
        }),
        key_usage: Some(KeyUsage(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN)),
        ..record(subject, issuer)
    }
}

pub(crate) fn fake_signature(tbs: &[u8], algorithm: SignatureAlgorithm, key: &PublicKeyInfo) -> Vec<u8> {
    let mut sig = key.data.clone();
    if algorithm.signs_raw_message() {
        sig.extend_from_slice(tbs);
    } else if let Some(digest) = algorithm.hash.and_then(|h| h.digest(tbs)) {
        sig.extend(digest);
    }
    sig
}

/// Derive `tbs` from the record's fields, sign it with `issuer`'s key and
/// set `raw` so that distinct records never share an encoding.
pub(crate) fn signed_by(mut cert: CertificateRecord, issuer: &CertificateRecord) -> CertificateRecord {
    cert.tbs = format!(
        "{}|{}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}",
        cert.subject.display,
        cert.issuer.display,
        cert.serial,
        cert.validity,
        cert.public_key.data,
        cert.signature_algorithm,
        cert.basic_constraints,
        cert.key_usage,
    )
    .into_bytes();
    cert.signature = fake_signature(&cert.tbs, cert.signature_algorithm, &issuer.public_key);
    cert.raw = [cert.tbs.as_slice(), b"#", cert.signature.as_slice()].concat();
    cert
}

pub(crate) fn self_signed(cert: CertificateRecord) -> CertificateRecord {
    let key = cert.clone();
    signed_by(cert, &key)
}

/// Replace the subject key (and so every signature made with it).
pub(crate) fn with_key(mut cert: CertificateRecord, data: &str) -> CertificateRecord {
    cert.public_key.data = data.as_bytes().to_vec();
    cert
}
