#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use certchk_lib::{
    parse_der, parse_pem, BasicConstraints, CertificateRecord, Curve, HashAlgorithm, KeyAlgorithm,
    KeyUsage, Name, PublicKeyInfo, SignatureAlgorithm, SignatureVerifier, Validity,
};
use rcgen::{
    Certificate, CertificateParams, CertificateRevocationList, CertificateRevocationListParams,
    DistinguishedName, DnType, IsCa, KeyIdMethod, KeyPair, KeyUsagePurpose, RevokedCertParams,
    SerialNumber,
};

/// 2023-11-14T22:13:20Z, inside every fixture's validity window.
pub const NOW: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

/// Deterministic backend: a signature is the signer's key bytes followed
/// by the message digest.
pub struct FakeVerifier;

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

pub fn name(cn: &str) -> Name {
    Name::new(format!("CN={}", cn).into_bytes(), format!("CN = {}", cn))
}

pub fn record(subject: &str, issuer: &str) -> CertificateRecord {
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

pub fn ca(subject: &str, issuer: &str) -> CertificateRecord {
    CertificateRecord {
        basic_constraints: Some(BasicConstraints {
            ca: true,
            path_len: None,
        }),
        key_usage: Some(KeyUsage(KeyUsage::KEY_CERT_SIGN | KeyUsage::CRL_SIGN)),
        ..record(subject, issuer)
    }
}

pub fn fake_signature(tbs: &[u8], algorithm: SignatureAlgorithm, key: &PublicKeyInfo) -> Vec<u8> {
    let mut sig = key.data.clone();
    if algorithm.signs_raw_message() {
        sig.extend_from_slice(tbs);
    } else if let Some(digest) = algorithm.hash.and_then(|h| h.digest(tbs)) {
        sig.extend(digest);
    }
    sig
}

pub fn signed_by(mut cert: CertificateRecord, issuer: &CertificateRecord) -> CertificateRecord {
    cert.tbs = format!(
        "{}|{}|{:?}|{:?}|{:?}|{:?}|{:?}",
        cert.subject,
        cert.issuer,
        cert.serial,
        cert.validity,
        cert.public_key.data,
        cert.signature_algorithm,
        cert.basic_constraints,
    )
    .into_bytes();
    cert.signature = fake_signature(&cert.tbs, cert.signature_algorithm, &issuer.public_key);
    cert.raw = [cert.tbs.as_slice(), b"#", cert.signature.as_slice()].concat();
    cert
}

pub fn self_signed(cert: CertificateRecord) -> CertificateRecord {
    let key = cert.clone();
    signed_by(cert, &key)
}

/// Synthetic root -> intermediate -> leaf.
pub struct SyntheticPki {
    pub root: CertificateRecord,
    pub int: CertificateRecord,
    pub leaf: CertificateRecord,
}

pub fn synthetic_pki() -> SyntheticPki {
    synthetic_pki_with_hash(HashAlgorithm::Sha256)
}

pub fn synthetic_pki_with_hash(hash: HashAlgorithm) -> SyntheticPki {
    let root = self_signed(ca("Root", "Root"));
    let mut int = ca("Int", "Root");
    int.signature_algorithm.hash = Some(hash);
    let int = signed_by(int, &root);
    let mut leaf = record("leaf.example.com", "Int");
    leaf.signature_algorithm.hash = Some(hash);
    leaf.dns_names = vec!["leaf.example.com".into()];
    let leaf = signed_by(leaf, &int);
    SyntheticPki { root, int, leaf }
}

fn rcgen_params(cn: &str, sans: Vec<String>) -> CertificateParams {
    let mut params = CertificateParams::new(sans);
    params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(2040, 1, 1);
    params
}

/// An ECDSA P-256 CA certificate.
pub fn rcgen_ca(cn: &str) -> Certificate {
    rcgen_ca_with(cn, &rcgen::PKCS_ECDSA_P256_SHA256, None)
}

/// A CA certificate signing with `alg`, using `key` or a fresh key pair.
pub fn rcgen_ca_with(
    cn: &str,
    alg: &'static rcgen::SignatureAlgorithm,
    key: Option<KeyPair>,
) -> Certificate {
    let mut params = rcgen_params(cn, vec![]);
    params.alg = alg;
    params.key_pair = key;
    params.is_ca = IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    Certificate::from_params(params).expect("ca params")
}

/// DER encodings of a self-signed `root` and a P-256 leaf it issued.
pub fn rcgen_root_and_leaf(root: &Certificate, host: &str) -> (Vec<u8>, Vec<u8>) {
    let root_der = root.serialize_der().expect("root der");
    let leaf_der = rcgen_leaf(host)
        .serialize_der_with_signer(root)
        .expect("leaf der");
    (root_der, leaf_der)
}

/// An ECDSA P-256 end-entity certificate for `host`.
pub fn rcgen_leaf(host: &str) -> Certificate {
    let mut params = rcgen_params(host, vec![host.to_string()]);
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
    Certificate::from_params(params).expect("leaf params")
}

/// DER encodings of a real root -> intermediate -> leaf chain.
pub struct RealPki {
    pub root_der: Vec<u8>,
    pub root_pem: String,
    pub int_der: Vec<u8>,
    pub leaf_der: Vec<u8>,
    /// The intermediate's signing key, kept for issuing CRLs.
    pub int_ca: Certificate,
}

impl RealPki {
    pub fn root(&self) -> CertificateRecord {
        parse_der(&self.root_der).expect("root parses")
    }

    pub fn int(&self) -> CertificateRecord {
        parse_der(&self.int_der).expect("intermediate parses")
    }

    pub fn leaf(&self) -> CertificateRecord {
        parse_der(&self.leaf_der).expect("leaf parses")
    }

    /// A PEM CRL from the intermediate listing `serials`, revoked on
    /// 2021-01-01 and current until 2039.
    pub fn int_crl_pem(&self, serials: &[&[u8]]) -> String {
        let params = CertificateRevocationListParams {
            this_update: rcgen::date_time_ymd(2021, 1, 1),
            next_update: rcgen::date_time_ymd(2039, 1, 1),
            crl_number: SerialNumber::from(1u64),
            issuing_distribution_point: None,
            revoked_certs: serials
                .iter()
                .map(|serial| RevokedCertParams {
                    serial_number: SerialNumber::from_slice(serial),
                    revocation_time: rcgen::date_time_ymd(2021, 1, 1),
                    reason_code: None,
                    invalidity_date: None,
                })
                .collect(),
            alg: &rcgen::PKCS_ECDSA_P256_SHA256,
            key_identifier_method: KeyIdMethod::Sha256,
        };
        CertificateRevocationList::from_params(params)
            .expect("crl params")
            .serialize_pem_with_signer(&self.int_ca)
            .expect("crl pem")
    }
}

pub fn real_pki() -> RealPki {
    let root = rcgen_ca("certchk test root");
    let int = rcgen_ca("certchk test intermediate");
    let leaf = rcgen_leaf("leaf.certchk.test");
    // ECDSA signatures are randomized; serialize the root once.
    let root_pem = root.serialize_pem().expect("root pem");
    let root_der = parse_pem(root_pem.as_bytes()).expect("root pem parses").raw;
    let int_der = int.serialize_der_with_signer(&root).expect("int der");
    let leaf_der = leaf.serialize_der_with_signer(&int).expect("leaf der");
    RealPki {
        root_der,
        root_pem,
        int_der,
        leaf_der,
        int_ca: int,
    }
}
