//! Centralized OID string constants used by the parser and the algorithm
//! tag mapping.
//!
//! Object Identifiers are referenced from RFC 5280 (X.509), RFC 3279 and
//! RFC 4055 (RSA signatures), RFC 5480 / RFC 5758 (ECC) and RFC 8410 (EdDSA).

// ── Distinguished Name attributes (RFC 4519 / X.520) ────────────────────

pub const COMMON_NAME: &str = "2.5.4.3";

// ── RSA PKCS#1 v1.5 signature algorithms ─────────────────────────────────

pub const MD5_WITH_RSA: &str = "1.2.840.113549.1.1.4";
pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";
pub const SHA224_WITH_RSA: &str = "1.2.840.113549.1.1.14";
pub const SHA256_WITH_RSA: &str = "1.2.840.113549.1.1.11";
pub const SHA384_WITH_RSA: &str = "1.2.840.113549.1.1.12";
pub const SHA512_WITH_RSA: &str = "1.2.840.113549.1.1.13";

// ── ECDSA signature algorithms ───────────────────────────────────────────

pub const ECDSA_WITH_SHA1: &str = "1.2.840.10045.4.1";
pub const ECDSA_WITH_SHA224: &str = "1.2.840.10045.4.3.1";
pub const ECDSA_WITH_SHA256: &str = "1.2.840.10045.4.3.2";
pub const ECDSA_WITH_SHA384: &str = "1.2.840.10045.4.3.3";
pub const ECDSA_WITH_SHA512: &str = "1.2.840.10045.4.3.4";

// ── EdDSA (signature algorithm and key type share the OID) ───────────────

pub const ED25519: &str = "1.3.101.112";

// ── Public key types ─────────────────────────────────────────────────────

pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

// ── Named elliptic curves ────────────────────────────────────────────────

pub const CURVE_P256: &str = "1.2.840.10045.3.1.7";
pub const CURVE_P384: &str = "1.3.132.0.34";
pub const CURVE_P521: &str = "1.3.132.0.35";
pub const CURVE_SECP256K1: &str = "1.3.132.0.10";
pub const CURVE_BRAINPOOL_P256R1: &str = "1.3.36.3.3.2.8.1.1.7";
pub const CURVE_BRAINPOOL_P384R1: &str = "1.3.36.3.3.2.8.1.1.11";
pub const CURVE_BRAINPOOL_P512R1: &str = "1.3.36.3.3.2.8.1.1.13";
