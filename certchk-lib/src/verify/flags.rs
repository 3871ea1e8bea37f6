//! Additive verification flags and the overall status.

use serde::ser::SerializeStruct;
use serde::Serialize;

/// Set of independent defect indicators.
///
/// Flags only accumulate: every check that fails contributes its bit, and
/// the result of a verification is the union over every certificate on the
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VerifyFlags(u32);

impl VerifyFlags {
    pub const EXPIRED: VerifyFlags = VerifyFlags(0x0001);
    pub const NOT_YET_VALID: VerifyFlags = VerifyFlags(0x0002);
    pub const NOT_TRUSTED: VerifyFlags = VerifyFlags(0x0004);
    pub const BAD_SIGNATURE: VerifyFlags = VerifyFlags(0x0008);
    pub const WEAK_HASH: VerifyFlags = VerifyFlags(0x0010);
    pub const WEAK_KEY: VerifyFlags = VerifyFlags(0x0020);
    pub const BAD_PK_ALG: VerifyFlags = VerifyFlags(0x0040);
    pub const BAD_CURVE: VerifyFlags = VerifyFlags(0x0080);
    pub const REVOKED: VerifyFlags = VerifyFlags(0x0100);
    pub const NAME_MISMATCH: VerifyFlags = VerifyFlags(0x0200);
    pub const PATH_LENGTH_EXCEEDED: VerifyFlags = VerifyFlags(0x0400);
    pub const NOT_CA: VerifyFlags = VerifyFlags(0x0800);
    pub const KEY_USAGE: VerifyFlags = VerifyFlags(0x1000);
    pub const CRL_NOT_TRUSTED: VerifyFlags = VerifyFlags(0x2000);
    pub const CRL_EXPIRED: VerifyFlags = VerifyFlags(0x4000);
    pub const CRL_FUTURE: VerifyFlags = VerifyFlags(0x8000);
    pub const CRL_WEAK_HASH: VerifyFlags = VerifyFlags(0x1_0000);
    pub const APPLICATION: VerifyFlags = VerifyFlags(0x2_0000);

    const DESCRIPTIONS: [(VerifyFlags, &'static str, &'static str); 18] = [
        (Self::EXPIRED, "expired", "the certificate validity has expired"),
        (Self::NOT_YET_VALID, "not_yet_valid", "the certificate validity starts in the future"),
        (Self::NOT_TRUSTED, "not_trusted", "the certificate is not correctly signed by the trusted CA"),
        (Self::BAD_SIGNATURE, "bad_signature", "the certificate signature does not verify with its issuer key"),
        (Self::WEAK_HASH, "weak_hash", "the certificate is signed with an unacceptable hash"),
        (Self::WEAK_KEY, "weak_key", "the certificate is signed with an unacceptable key (eg bad curve, RSA too short)"),
        (Self::BAD_PK_ALG, "bad_pk_alg", "the certificate is signed with an unacceptable PK alg (eg RSA vs ECDSA)"),
        (Self::BAD_CURVE, "bad_curve", "the certificate key uses an unacceptable elliptic curve"),
        (Self::REVOKED, "revoked", "the certificate has been revoked (is on a CRL)"),
        (Self::NAME_MISMATCH, "name_mismatch", "the certificate name does not match the expected name"),
        (Self::PATH_LENGTH_EXCEEDED, "path_length_exceeded", "a path length constraint of an issuer is exceeded"),
        (Self::NOT_CA, "not_ca", "an issuer on the path is not a CA certificate"),
        (Self::KEY_USAGE, "key_usage", "an issuer key usage does not allow certificate signing"),
        (Self::CRL_NOT_TRUSTED, "crl_not_trusted", "the CRL is not correctly signed by the trusted CA"),
        (Self::CRL_EXPIRED, "crl_expired", "the CRL is expired"),
        (Self::CRL_FUTURE, "crl_future", "the CRL is from the future"),
        (Self::CRL_WEAK_HASH, "crl_weak_hash", "the CRL is signed with an unacceptable hash"),
        (Self::APPLICATION, "application", "the verification callback rejected the certificate"),
    ];

    pub const fn empty() -> Self {
        VerifyFlags(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping bits that have no meaning.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        VerifyFlags(bits & Self::all().0)
    }

    pub const fn all() -> Self {
        VerifyFlags(0x3_FFFF)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: VerifyFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: VerifyFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: VerifyFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: VerifyFlags) {
        self.0 &= !other.0;
    }

    /// Insert `flag` when `condition` holds.
    pub fn set_if(&mut self, condition: bool, flag: VerifyFlags) {
        if condition {
            self.insert(flag);
        }
    }

    /// Individual flags that are set, lowest bit first.
    pub fn iter(self) -> impl Iterator<Item = VerifyFlags> {
        Self::DESCRIPTIONS
            .into_iter()
            .map(|(flag, _, _)| flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Stable snake_case names of the set flags.
    pub fn names(self) -> Vec<&'static str> {
        Self::DESCRIPTIONS
            .into_iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, name, _)| name)
            .collect()
    }

    /// One human-readable line per set flag.
    pub fn describe(self) -> Vec<&'static str> {
        Self::DESCRIPTIONS
            .into_iter()
            .filter(|(flag, _, _)| self.contains(*flag))
            .map(|(_, _, text)| text)
            .collect()
    }
}

impl std::ops::BitOr for VerifyFlags {
    type Output = VerifyFlags;

    fn bitor(self, rhs: VerifyFlags) -> VerifyFlags {
        VerifyFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for VerifyFlags {
    fn bitor_assign(&mut self, rhs: VerifyFlags) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for VerifyFlags {
    type Output = VerifyFlags;

    fn bitand(self, rhs: VerifyFlags) -> VerifyFlags {
        VerifyFlags(self.0 & rhs.0)
    }
}

impl std::ops::Not for VerifyFlags {
    type Output = VerifyFlags;

    fn not(self) -> VerifyFlags {
        VerifyFlags(!self.0 & Self::all().0)
    }
}

impl std::fmt::Display for VerifyFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

impl Serialize for VerifyFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("VerifyFlags", 2)?;
        s.serialize_field("bits", &self.0)?;
        s.serialize_field("names", &self.names())?;
        s.end()
    }
}

/// Overall outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}
