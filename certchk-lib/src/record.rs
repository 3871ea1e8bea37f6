//! Structured certificate and CRL records consumed by the verifier.
//!
//! Records are produced by the parser (or built directly by callers that
//! decode certificates some other way) and are never mutated during
//! verification.

use serde::{Deserialize, Serialize};

use crate::fingerprint::compute_fingerprint;
use crate::util;

/// Digest algorithm used when signing a certificate or CRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Every recognized hash, weakest first.
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Bit assigned to this algorithm in a profile mask.
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha224 => "SHA-224",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Public-key algorithm of a subject key or of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Rsa,
    Ec,
    Ed25519,
}

impl KeyAlgorithm {
    pub const ALL: [KeyAlgorithm; 3] = [KeyAlgorithm::Rsa, KeyAlgorithm::Ec, KeyAlgorithm::Ed25519];

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyAlgorithm::Rsa => "RSA",
            KeyAlgorithm::Ec => "EC",
            KeyAlgorithm::Ed25519 => "Ed25519",
        }
    }
}

impl std::fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Named elliptic curve of an EC public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    P256,
    P384,
    P521,
    Secp256k1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
}

impl Curve {
    pub const ALL: [Curve; 7] = [
        Curve::P256,
        Curve::P384,
        Curve::P521,
        Curve::Secp256k1,
        Curve::BrainpoolP256r1,
        Curve::BrainpoolP384r1,
        Curve::BrainpoolP512r1,
    ];

    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// Field size in bits.
    pub fn bits(self) -> u32 {
        match self {
            Curve::P256 | Curve::Secp256k1 | Curve::BrainpoolP256r1 => 256,
            Curve::P384 | Curve::BrainpoolP384r1 => 384,
            Curve::BrainpoolP512r1 => 512,
            Curve::P521 => 521,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Curve::P256 => "P-256",
            Curve::P384 => "P-384",
            Curve::P521 => "P-521",
            Curve::Secp256k1 => "secp256k1",
            Curve::BrainpoolP256r1 => "brainpoolP256r1",
            Curve::BrainpoolP384r1 => "brainpoolP384r1",
            Curve::BrainpoolP512r1 => "brainpoolP512r1",
        }
    }
}

impl std::fmt::Display for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature algorithm tag. `None` components were not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SignatureAlgorithm {
    pub hash: Option<HashAlgorithm>,
    pub key: Option<KeyAlgorithm>,
}

impl SignatureAlgorithm {
    pub const fn new(key: KeyAlgorithm, hash: HashAlgorithm) -> Self {
        SignatureAlgorithm {
            hash: Some(hash),
            key: Some(key),
        }
    }

    /// A scheme that signs the message itself, with no separate digest.
    pub const fn pure(key: KeyAlgorithm) -> Self {
        SignatureAlgorithm {
            hash: None,
            key: Some(key),
        }
    }

    /// Whether the signature covers the raw message rather than a digest
    /// (PureEdDSA, RFC 8032).
    pub fn signs_raw_message(self) -> bool {
        self.key == Some(KeyAlgorithm::Ed25519)
    }
}

/// A distinguished name. Identity comparisons use the raw DER encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    /// DER encoding of the name.
    pub raw: Vec<u8>,
    /// Human-readable one-line form.
    pub display: String,
}

impl Name {
    pub fn new(raw: impl Into<Vec<u8>>, display: impl Into<String>) -> Self {
        Name {
            raw: raw.into(),
            display: display.into(),
        }
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display)
    }
}

/// Validity window in Unix seconds, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Validity {
    pub not_before: i64,
    pub not_after: i64,
}

impl Validity {
    pub fn contains(&self, at: i64) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

/// Subject public key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PublicKeyInfo {
    pub algorithm: Option<KeyAlgorithm>,
    /// Only set for EC keys on a recognized curve.
    pub curve: Option<Curve>,
    /// RSA modulus length or curve size.
    pub bits: u32,
    /// PKCS#1 RSAPublicKey DER for RSA, SEC1 point for EC, raw key for Ed25519.
    pub data: Vec<u8>,
}

/// BasicConstraints extension (RFC 5280 Section 4.2.1.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BasicConstraints {
    pub ca: bool,
    pub path_len: Option<u32>,
}

/// KeyUsage extension bits, numbered as in RFC 5280 Section 4.2.1.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KeyUsage(pub u16);

impl KeyUsage {
    pub const DIGITAL_SIGNATURE: u16 = 1 << 0;
    pub const NON_REPUDIATION: u16 = 1 << 1;
    pub const KEY_ENCIPHERMENT: u16 = 1 << 2;
    pub const DATA_ENCIPHERMENT: u16 = 1 << 3;
    pub const KEY_AGREEMENT: u16 = 1 << 4;
    pub const KEY_CERT_SIGN: u16 = 1 << 5;
    pub const CRL_SIGN: u16 = 1 << 6;
    pub const ENCIPHER_ONLY: u16 = 1 << 7;
    pub const DECIPHER_ONLY: u16 = 1 << 8;

    pub fn key_cert_sign(self) -> bool {
        self.0 & Self::KEY_CERT_SIGN != 0
    }

    pub fn crl_sign(self) -> bool {
        self.0 & Self::CRL_SIGN != 0
    }
}

/// One decoded certificate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CertificateRecord {
    pub subject: Name,
    pub issuer: Name,
    /// Serial number as raw big-endian bytes.
    pub serial: Vec<u8>,
    pub validity: Validity,
    pub public_key: PublicKeyInfo,
    pub signature_algorithm: SignatureAlgorithm,
    pub signature: Vec<u8>,
    pub basic_constraints: Option<BasicConstraints>,
    pub key_usage: Option<KeyUsage>,
    /// DNS names from the Subject Alternative Name extension.
    pub dns_names: Vec<String>,
    pub common_name: Option<String>,
    /// The signed portion (TBSCertificate) exactly as encoded.
    pub tbs: Vec<u8>,
    /// Full DER encoding; also the identity used by the cycle guard.
    pub raw: Vec<u8>,
}

impl CertificateRecord {
    /// Subject equals issuer.
    ///
    /// RFC 5280 Section 6.1: self-issued certificates do not count toward
    /// pathLenConstraint.
    pub fn is_self_issued(&self) -> bool {
        self.subject.raw == self.issuer.raw
    }

    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_some_and(|bc| bc.ca)
    }

    /// Serial number as colon-separated uppercase hex.
    pub fn serial_hex(&self) -> String {
        util::hex_colon_upper(util::strip_leading_zeros(&self.serial))
    }

    /// Short human-readable identifier: the CN, or the full subject when
    /// there is none.
    pub fn short_name(&self) -> String {
        match &self.common_name {
            Some(cn) if !cn.is_empty() => cn.clone(),
            _ if !self.subject.display.is_empty() => self.subject.display.clone(),
            _ => "Unknown".to_string(),
        }
    }

    /// SHA-256 fingerprint of the full encoding.
    pub fn fingerprint(&self) -> String {
        compute_fingerprint(&self.raw, HashAlgorithm::Sha256)
    }
}

/// One entry on a revocation list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RevokedEntry {
    pub serial: Vec<u8>,
    pub revocation_date: i64,
}

/// One decoded certificate revocation list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrlRecord {
    pub issuer: Name,
    pub this_update: i64,
    pub next_update: Option<i64>,
    pub revoked: Vec<RevokedEntry>,
    pub signature_algorithm: SignatureAlgorithm,
    pub signature: Vec<u8>,
    /// The signed portion (TBSCertList) exactly as encoded.
    pub tbs: Vec<u8>,
}

impl CrlRecord {
    /// Find the entry for `serial`, comparing without leading zero octets.
    pub fn find(&self, serial: &[u8]) -> Option<&RevokedEntry> {
        let wanted = util::strip_leading_zeros(serial);
        self.revoked
            .iter()
            .find(|r| util::strip_leading_zeros(&r.serial) == wanted)
    }
}
