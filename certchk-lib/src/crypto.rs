//! Cryptographic collaborator: message digests and the signature primitive.
//!
//! The verifier never calls a signature library directly. It hashes the
//! signed content itself and hands the digest to a [`SignatureVerifier`],
//! so callers can plug in an HSM, a FIPS module or a test double. Ed25519
//! has no separate digest; for it the signed content is handed over as is.

use digest::Digest;
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};

use crate::record::{Curve, HashAlgorithm, KeyAlgorithm, PublicKeyInfo, SignatureAlgorithm};

impl HashAlgorithm {
    /// Digest `data` with this algorithm.
    ///
    /// MD5 is recognized for policy purposes but never computed; `None`
    /// makes every MD5-signed link unverifiable.
    pub fn digest(self, data: &[u8]) -> Option<Vec<u8>> {
        let out = match self {
            HashAlgorithm::Md5 => return None,
            HashAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => sha2::Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => sha2::Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => sha2::Sha512::digest(data).to_vec(),
        };
        Some(out)
    }
}

/// Opaque signature verification primitive.
///
/// Implementations must be reentrant: the verifier calls them from many
/// threads at once through a shared reference. Any scratch state has to
/// be created inside the call.
pub trait SignatureVerifier: Send + Sync {
    /// Check `signature` under `public_key`.
    ///
    /// `message_hash` is the digest named by `algorithm`, or the message
    /// itself when [`SignatureAlgorithm::signs_raw_message`] holds.
    fn verify_signature(
        &self,
        message_hash: &[u8],
        signature: &[u8],
        public_key: &PublicKeyInfo,
        algorithm: SignatureAlgorithm,
    ) -> bool;
}

/// Default backend built on the RustCrypto crates.
///
/// Supports RSA PKCS#1 v1.5 (SHA-1 and SHA-2 family), ECDSA on P-256
/// and P-384, and Ed25519.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustCryptoVerifier;

impl SignatureVerifier for RustCryptoVerifier {
    fn verify_signature(
        &self,
        message_hash: &[u8],
        signature: &[u8],
        public_key: &PublicKeyInfo,
        algorithm: SignatureAlgorithm,
    ) -> bool {
        // The signature scheme must match the type of the issuer key.
        if algorithm.key.is_none() || algorithm.key != public_key.algorithm {
            return false;
        }
        match (public_key.algorithm, algorithm.hash) {
            (Some(KeyAlgorithm::Rsa), Some(hash)) => {
                verify_rsa_pkcs1(message_hash, signature, &public_key.data, hash)
            }
            (Some(KeyAlgorithm::Ec), Some(_)) => match public_key.curve {
                Some(Curve::P256) => verify_p256(message_hash, signature, &public_key.data),
                Some(Curve::P384) => verify_p384(message_hash, signature, &public_key.data),
                _ => false,
            },
            (Some(KeyAlgorithm::Ed25519), None) => {
                verify_ed25519(message_hash, signature, &public_key.data)
            }
            _ => false,
        }
    }
}

fn verify_rsa_pkcs1(hashed: &[u8], signature: &[u8], key_der: &[u8], hash: HashAlgorithm) -> bool {
    let Ok(key) = RsaPublicKey::from_pkcs1_der(key_der) else {
        return false;
    };
    let scheme = match hash {
        HashAlgorithm::Md5 => return false,
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    };
    key.verify(scheme, hashed, signature).is_ok()
}

fn verify_p256(hashed: &[u8], signature: &[u8], point: &[u8]) -> bool {
    let Ok(key) = p256::ecdsa::VerifyingKey::from_sec1_bytes(point) else {
        return false;
    };
    let Ok(sig) = p256::ecdsa::Signature::from_der(signature) else {
        return false;
    };
    key.verify_prehash(hashed, &sig).is_ok()
}

fn verify_p384(hashed: &[u8], signature: &[u8], point: &[u8]) -> bool {
    let Ok(key) = p384::ecdsa::VerifyingKey::from_sec1_bytes(point) else {
        return false;
    };
    let Ok(sig) = p384::ecdsa::Signature::from_der(signature) else {
        return false;
    };
    key.verify_prehash(hashed, &sig).is_ok()
}

fn verify_ed25519(message: &[u8], signature: &[u8], key: &[u8]) -> bool {
    let Ok(key) = <[u8; 32]>::try_from(key) else {
        return false;
    };
    let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(&key) else {
        return false;
    };
    let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
        return false;
    };
    key.verify_strict(message, &sig).is_ok()
}
