//! Certificate and CRL parsing from PEM and DER into records.
//!
//! This is the decoding collaborator of the verifier. Anything malformed is
//! rejected here, before verification is attempted.

use x509_parser::prelude::*;
use x509_parser::revocation_list::CertificateRevocationList;

use crate::oid;
use crate::record::{
    BasicConstraints, CertificateRecord, CrlRecord, Curve, HashAlgorithm, KeyAlgorithm, KeyUsage,
    Name, PublicKeyInfo, RevokedEntry, SignatureAlgorithm, Validity,
};
use crate::util;
use crate::CertchkError;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<CertificateRecord, CertchkError> {
    if input.is_empty() {
        return Err(CertchkError::ParseError("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse the first certificate of a PEM document.
pub fn parse_pem(input: &[u8]) -> Result<CertificateRecord, CertchkError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertchkError::PemError(format!("{}", e)))?;

    if pem.label != "CERTIFICATE"
        && pem.label != "TRUSTED CERTIFICATE"
        && pem.label != "X509 CERTIFICATE"
    {
        return Err(CertchkError::PemError(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<CertificateRecord, CertchkError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| CertchkError::DerError(format!("{}", e)))?;

    // Keep only the certificate bytes, not trailing data, so the identity
    // used by the cycle guard is the certificate itself.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_record(&x509, cert_der)
}

/// Parse a PEM file containing one or more certificates.
///
/// Stops at the first malformed block once at least one certificate was
/// read (trailing garbage); fails if the first block is malformed.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<CertificateRecord>, CertchkError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
                    certs.push(parse_der(&pem.contents)?);
                }
            }
            Err(e) => {
                if !certs.is_empty() {
                    break;
                }
                return Err(CertchkError::PemError(format!("failed to parse PEM: {}", e)));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertchkError::PemError(
            "no certificates found in PEM input".into(),
        ));
    }

    Ok(certs)
}

/// Parse a DER-encoded CRL.
pub fn parse_der_crl(input: &[u8]) -> Result<CrlRecord, CertchkError> {
    let (_, crl) = CertificateRevocationList::from_der(input)
        .map_err(|e| CertchkError::DerError(format!("failed to parse CRL: {}", e)))?;

    let revoked = crl
        .iter_revoked_certificates()
        .map(|r| RevokedEntry {
            serial: r.raw_serial().to_vec(),
            revocation_date: r.revocation_date.timestamp(),
        })
        .collect();

    Ok(CrlRecord {
        issuer: build_name(crl.issuer()),
        this_update: crl.last_update().timestamp(),
        next_update: crl.next_update().map(|t| t.timestamp()),
        revoked,
        signature_algorithm: signature_algorithm_from_oid(
            &crl.signature_algorithm.algorithm.to_id_string(),
        ),
        signature: crl.signature_value.data.to_vec(),
        tbs: crl.tbs_cert_list.as_ref().to_vec(),
    })
}

/// Parse every `X509 CRL` block of a PEM document.
pub fn parse_pem_crls(input: &[u8]) -> Result<Vec<CrlRecord>, CertchkError> {
    let mut crls = Vec::new();
    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if pem.label == "X509 CRL" {
                    crls.push(parse_der_crl(&pem.contents)?);
                }
            }
            Err(e) => {
                if !crls.is_empty() {
                    break;
                }
                return Err(CertchkError::PemError(format!(
                    "failed to parse CRL PEM: {}",
                    e
                )));
            }
        }
    }
    if crls.is_empty() {
        return Err(CertchkError::PemError("no CRLs found in PEM input".into()));
    }
    Ok(crls)
}

fn build_record(x509: &X509Certificate, raw_der: &[u8]) -> Result<CertificateRecord, CertchkError> {
    let tbs = &x509.tbs_certificate;

    if tbs.version.0 > 2 {
        return Err(CertchkError::ParseError(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            tbs.version.0 + 1
        )));
    }

    let basic_constraints = x509
        .basic_constraints()
        .map_err(|e| CertchkError::ParseError(format!("invalid BasicConstraints: {}", e)))?
        .map(|bc| BasicConstraints {
            ca: bc.value.ca,
            path_len: bc.value.path_len_constraint,
        });

    let key_usage = x509
        .key_usage()
        .map_err(|e| CertchkError::ParseError(format!("invalid KeyUsage: {}", e)))?
        .map(|ku| KeyUsage(ku.value.flags));

    Ok(CertificateRecord {
        subject: build_name(x509.subject()),
        issuer: build_name(x509.issuer()),
        serial: x509.raw_serial().to_vec(),
        validity: Validity {
            not_before: x509.validity().not_before.timestamp(),
            not_after: x509.validity().not_after.timestamp(),
        },
        public_key: build_public_key(x509.public_key()),
        signature_algorithm: signature_algorithm_from_oid(
            &x509.signature_algorithm.algorithm.to_id_string(),
        ),
        signature: x509.signature_value.data.to_vec(),
        basic_constraints,
        key_usage,
        dns_names: extract_san_dns_names(x509),
        common_name: extract_cn(x509),
        tbs: tbs.as_ref().to_vec(),
        raw: raw_der.to_vec(),
    })
}

fn build_name(name: &X509Name) -> Name {
    Name {
        raw: name.as_raw().to_vec(),
        display: name.to_string(),
    }
}

/// Map a signature algorithm OID to its (key, hash) tag pair.
///
/// Ed25519 has no separate digest and carries no hash tag.
pub(crate) fn signature_algorithm_from_oid(oid_str: &str) -> SignatureAlgorithm {
    use HashAlgorithm::*;
    use KeyAlgorithm::*;
    match oid_str {
        oid::MD5_WITH_RSA => SignatureAlgorithm::new(Rsa, Md5),
        oid::SHA1_WITH_RSA => SignatureAlgorithm::new(Rsa, Sha1),
        oid::SHA224_WITH_RSA => SignatureAlgorithm::new(Rsa, Sha224),
        oid::SHA256_WITH_RSA => SignatureAlgorithm::new(Rsa, Sha256),
        oid::SHA384_WITH_RSA => SignatureAlgorithm::new(Rsa, Sha384),
        oid::SHA512_WITH_RSA => SignatureAlgorithm::new(Rsa, Sha512),
        oid::ECDSA_WITH_SHA1 => SignatureAlgorithm::new(Ec, Sha1),
        oid::ECDSA_WITH_SHA224 => SignatureAlgorithm::new(Ec, Sha224),
        oid::ECDSA_WITH_SHA256 => SignatureAlgorithm::new(Ec, Sha256),
        oid::ECDSA_WITH_SHA384 => SignatureAlgorithm::new(Ec, Sha384),
        oid::ECDSA_WITH_SHA512 => SignatureAlgorithm::new(Ec, Sha512),
        oid::ED25519 => SignatureAlgorithm::pure(Ed25519),
        _ => SignatureAlgorithm::default(),
    }
}

pub(crate) fn curve_from_oid(oid_str: &str) -> Option<Curve> {
    match oid_str {
        oid::CURVE_P256 => Some(Curve::P256),
        oid::CURVE_P384 => Some(Curve::P384),
        oid::CURVE_P521 => Some(Curve::P521),
        oid::CURVE_SECP256K1 => Some(Curve::Secp256k1),
        oid::CURVE_BRAINPOOL_P256R1 => Some(Curve::BrainpoolP256r1),
        oid::CURVE_BRAINPOOL_P384R1 => Some(Curve::BrainpoolP384r1),
        oid::CURVE_BRAINPOOL_P512R1 => Some(Curve::BrainpoolP512r1),
        _ => None,
    }
}

fn build_public_key(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let data = spki.subject_public_key.data.to_vec();
    match spki.algorithm.algorithm.to_id_string().as_str() {
        oid::RSA_ENCRYPTION => PublicKeyInfo {
            algorithm: Some(KeyAlgorithm::Rsa),
            curve: None,
            bits: rsa_modulus_bits(&data).unwrap_or(0),
            data,
        },
        oid::EC_PUBLIC_KEY => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .and_then(|o| curve_from_oid(&o.to_id_string()));
            PublicKeyInfo {
                algorithm: Some(KeyAlgorithm::Ec),
                curve,
                bits: curve.map_or(0, Curve::bits),
                data,
            }
        }
        oid::ED25519 => PublicKeyInfo {
            algorithm: Some(KeyAlgorithm::Ed25519),
            curve: None,
            bits: 256,
            data,
        },
        _ => PublicKeyInfo {
            algorithm: None,
            curve: None,
            bits: 0,
            data,
        },
    }
}

/// Bit length of the modulus in a PKCS#1 RSAPublicKey.
fn rsa_modulus_bits(data: &[u8]) -> Option<u32> {
    let (_, parsed) = x509_parser::der_parser::parse_der(data).ok()?;
    let seq = parsed.as_sequence().ok()?;
    let modulus = seq.first().and_then(|m| m.as_slice().ok())?;
    let significant = util::strip_leading_zeros(modulus);
    let first = *significant.first()?;
    let bytes = u32::try_from(significant.len()).ok()?;
    Some(bytes * 8 - first.leading_zeros())
}

/// Extract DNS names from the Subject Alternative Name extension.
fn extract_san_dns_names(cert: &X509Certificate) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for gn in &san.value.general_names {
            if let GeneralName::DNSName(name) = gn {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Extract the Common Name from the certificate subject.
fn extract_cn(cert: &X509Certificate) -> Option<String> {
    for rdn in cert.subject().iter() {
        for attr in rdn.iter() {
            if attr.attr_type().to_id_string() == oid::COMMON_NAME {
                return attr.as_str().ok().map(|s| s.to_string());
            }
        }
    }
    None
}
