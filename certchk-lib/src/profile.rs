//! Cryptographic acceptance profiles.
//!
//! A [`Profile`] is an immutable set of bitmasks (allowed signing hashes,
//! public-key algorithms and curves) plus a minimum RSA modulus size. It is
//! shared read-only across any number of concurrent verifications.

use serde::{Deserialize, Serialize};

use crate::record::{Curve, HashAlgorithm, KeyAlgorithm, SignatureAlgorithm};
use crate::CertchkError;

/// Cryptographic acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Profile {
    allowed_hashes: u32,
    allowed_key_algorithms: u32,
    allowed_curves: u32,
    min_rsa_bits: u32,
}

#[allow(clippy::indexing_slicing)] // i < hashes.len()
const fn hash_mask(hashes: &[HashAlgorithm]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < hashes.len() {
        mask |= hashes[i].bit();
        i += 1;
    }
    mask
}

#[allow(clippy::indexing_slicing)] // i < curves.len()
const fn curve_mask(curves: &[Curve]) -> u32 {
    let mut mask = 0;
    let mut i = 0;
    while i < curves.len() {
        mask |= curves[i].bit();
        i += 1;
    }
    mask
}

const ALL_KEY_ALGORITHMS: u32 =
    KeyAlgorithm::Rsa.bit() | KeyAlgorithm::Ec.bit() | KeyAlgorithm::Ed25519.bit();

const ALL_CURVES: u32 = curve_mask(&Curve::ALL);

impl Profile {
    /// Current default: SHA-2 family only, any key type, any recognized
    /// curve, RSA keys of at least 2048 bits.
    pub const fn modern() -> Self {
        Profile {
            allowed_hashes: hash_mask(&[
                HashAlgorithm::Sha224,
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha384,
                HashAlgorithm::Sha512,
            ]),
            allowed_key_algorithms: ALL_KEY_ALGORITHMS,
            allowed_curves: ALL_CURVES,
            min_rsa_bits: 2048,
        }
    }

    /// [`Profile::modern`] plus SHA-1, for peers that still issue legacy
    /// certificates. Opt-in only.
    pub const fn compatibility() -> Self {
        let modern = Self::modern();
        Profile {
            allowed_hashes: modern.allowed_hashes | HashAlgorithm::Sha1.bit(),
            ..modern
        }
    }

    /// SHA-256 and up, curves of at least 256 bits, RSA >= 2048.
    pub const fn next_generation() -> Self {
        Profile {
            allowed_hashes: hash_mask(&[
                HashAlgorithm::Sha256,
                HashAlgorithm::Sha384,
                HashAlgorithm::Sha512,
            ]),
            allowed_key_algorithms: ALL_KEY_ALGORITHMS,
            allowed_curves: ALL_CURVES,
            min_rsa_bits: 2048,
        }
    }

    /// NSA Suite B (RFC 6460): ECDSA with P-256/SHA-256 or P-384/SHA-384.
    pub const fn suite_b() -> Self {
        Profile {
            allowed_hashes: hash_mask(&[HashAlgorithm::Sha256, HashAlgorithm::Sha384]),
            allowed_key_algorithms: KeyAlgorithm::Ec.bit(),
            allowed_curves: curve_mask(&[Curve::P256, Curve::P384]),
            min_rsa_bits: 0,
        }
    }

    /// Look up a built-in profile by name.
    pub fn by_name(name: &str) -> Result<Self, CertchkError> {
        match name.to_ascii_lowercase().as_str() {
            "modern" | "default" => Ok(Self::modern()),
            "compat" | "compatibility" | "legacy" => Ok(Self::compatibility()),
            "next" | "next-generation" => Ok(Self::next_generation()),
            "suiteb" | "suite-b" => Ok(Self::suite_b()),
            other => Err(CertchkError::ProfileError(format!(
                "unknown profile '{}' (expected modern, compat, next or suiteb)",
                other
            ))),
        }
    }

    /// Build a profile from explicit lists.
    pub fn new(
        hashes: &[HashAlgorithm],
        key_algorithms: &[KeyAlgorithm],
        curves: &[Curve],
        min_rsa_bits: u32,
    ) -> Self {
        Profile {
            allowed_hashes: hash_mask(hashes),
            allowed_key_algorithms: key_algorithms.iter().fold(0, |m, k| m | k.bit()),
            allowed_curves: curve_mask(curves),
            min_rsa_bits,
        }
    }

    /// Parse a profile from its JSON configuration form.
    pub fn from_json(json: &str) -> Result<Self, CertchkError> {
        let config: ProfileConfig = serde_json::from_str(json)
            .map_err(|e| CertchkError::ProfileError(format!("invalid profile JSON: {}", e)))?;
        Ok(config.into())
    }

    /// Load a profile from a JSON file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, CertchkError> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            CertchkError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_json(&data)
    }

    pub fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.allowed_hashes |= hash.bit();
        self
    }

    pub fn without_hash(mut self, hash: HashAlgorithm) -> Self {
        self.allowed_hashes &= !hash.bit();
        self
    }

    pub fn with_min_rsa_bits(mut self, bits: u32) -> Self {
        self.min_rsa_bits = bits;
        self
    }

    pub fn allows_hash(&self, hash: HashAlgorithm) -> bool {
        self.allowed_hashes & hash.bit() != 0
    }

    pub fn allows_pubkey_alg(&self, alg: KeyAlgorithm) -> bool {
        self.allowed_key_algorithms & alg.bit() != 0
    }

    /// Whether a signature made with `alg` is strong enough.
    ///
    /// Digest-based schemes are judged by their hash. Ed25519 has no
    /// separate digest and is judged by its key algorithm alone.
    pub fn allows_signature(&self, alg: SignatureAlgorithm) -> bool {
        if alg.signs_raw_message() {
            return alg.key.is_some_and(|k| self.allows_pubkey_alg(k));
        }
        alg.hash.is_some_and(|h| self.allows_hash(h))
    }

    pub fn allows_curve(&self, curve: Curve) -> bool {
        self.allowed_curves & curve.bit() != 0
    }

    pub fn meets_min_key_size(&self, bits: u32) -> bool {
        bits >= self.min_rsa_bits
    }

    pub fn min_rsa_bits(&self) -> u32 {
        self.min_rsa_bits
    }

    /// Raw hash mask, one bit per [`HashAlgorithm::bit`].
    pub fn hash_bits(&self) -> u32 {
        self.allowed_hashes
    }

    /// Whether every hash allowed here is also allowed by `other`.
    pub fn hashes_subset_of(&self, other: &Profile) -> bool {
        self.allowed_hashes & !other.allowed_hashes == 0
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::modern()
    }
}

/// Serialized form of a profile: readable algorithm names instead of masks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    pub hashes: Vec<HashAlgorithm>,
    #[serde(default = "all_key_algorithms")]
    pub key_algorithms: Vec<KeyAlgorithm>,
    #[serde(default = "all_curves")]
    pub curves: Vec<Curve>,
    #[serde(default = "default_min_rsa_bits")]
    pub min_rsa_bits: u32,
}

fn default_min_rsa_bits() -> u32 {
    Profile::modern().min_rsa_bits
}

fn all_key_algorithms() -> Vec<KeyAlgorithm> {
    KeyAlgorithm::ALL.to_vec()
}

fn all_curves() -> Vec<Curve> {
    Curve::ALL.to_vec()
}

impl From<ProfileConfig> for Profile {
    fn from(config: ProfileConfig) -> Self {
        Profile::new(
            &config.hashes,
            &config.key_algorithms,
            &config.curves,
            config.min_rsa_bits,
        )
    }
}

impl From<&Profile> for ProfileConfig {
    fn from(profile: &Profile) -> Self {
        ProfileConfig {
            hashes: HashAlgorithm::ALL
                .into_iter()
                .filter(|h| profile.allows_hash(*h))
                .collect(),
            key_algorithms: KeyAlgorithm::ALL
                .into_iter()
                .filter(|k| profile.allows_pubkey_alg(*k))
                .collect(),
            curves: Curve::ALL
                .into_iter()
                .filter(|c| profile.allows_curve(*c))
                .collect(),
            min_rsa_bits: profile.min_rsa_bits,
        }
    }
}

impl Serialize for Profile {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ProfileConfig::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Profile {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ProfileConfig::deserialize(deserializer).map(Profile::from)
    }
}
