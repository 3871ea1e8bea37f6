//! Trust store management for CA certificates.
//!
//! Provides [`TrustStore`] for loading and querying trust anchors,
//! matching OpenSSL's trust store discovery behavior.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::debug;

use crate::parser::parse_pem_chain;
use crate::record::CertificateRecord;
use crate::CertchkError;

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Matches `.pem`, `.crt`, `.cer` and OpenSSL hash links (`XXXXXXXX.N`).
fn is_pem_cert_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

fn io_error_with_path(path: &Path, e: std::io::Error) -> CertchkError {
    CertchkError::Io(std::io::Error::new(
        e.kind(),
        format!("{}: {}", path.display(), e),
    ))
}

/// An ordered set of trust anchors.
///
/// Anchors keep their insertion order, which is also the order the chain
/// builder tries them in. Lookup by issuer name goes through an index on
/// the raw subject encoding. A store is never mutated by verification and
/// can be shared between threads.
#[derive(Clone, Default)]
pub struct TrustStore {
    anchors: Vec<CertificateRecord>,
    by_subject: HashMap<Vec<u8>, Vec<usize>>,
}

impl std::fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustStore")
            .field("count", &self.anchors.len())
            .finish()
    }
}

impl TrustStore {
    /// Create an empty trust store.
    pub fn new() -> Self {
        TrustStore::default()
    }

    /// Create a trust store from already decoded records.
    pub fn from_records(records: impl IntoIterator<Item = CertificateRecord>) -> Self {
        let mut store = TrustStore::new();
        for record in records {
            store.add(record);
        }
        store
    }

    /// Load the system trust store.
    ///
    /// Searches the same places OpenSSL does:
    /// 1. `SSL_CERT_FILE`, the `openssl-probe` bundle, then [`KNOWN_CA_BUNDLE_PATHS`]
    /// 2. `SSL_CERT_DIR`, the `openssl-probe` directory, then [`KNOWN_CA_DIR_PATHS`]
    pub fn system() -> Result<Self, CertchkError> {
        let mut store = TrustStore::new();

        if let Some(bundle_path) = find_system_ca_bundle() {
            if let Ok(data) = std::fs::read(&bundle_path) {
                let added = store.add_pem_bundle(&data)?;
                if added > 0 {
                    debug!("loaded {} anchors from {}", added, bundle_path.display());
                    return Ok(store);
                }
            }
        }

        let probe = openssl_probe::probe();
        let dir_candidates = std::env::var("SSL_CERT_DIR")
            .ok()
            .into_iter()
            .chain(
                probe
                    .cert_dir
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            )
            .chain(KNOWN_CA_DIR_PATHS.iter().map(|s| (*s).to_string()));

        for dir in dir_candidates {
            let dir_path = Path::new(&dir);
            if let Ok(added) = store.add_pem_directory(dir_path) {
                if added > 0 {
                    debug!("loaded {} anchors from {}", added, dir_path.display());
                    return Ok(store);
                }
            }
        }

        Err(CertchkError::VerifyError(
            "no system trust store found".into(),
        ))
    }

    /// Create a trust store from a PEM bundle (e.g., a CA certificates file).
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, CertchkError> {
        let mut store = TrustStore::new();
        store.add_pem_bundle(pem_data)?;
        Ok(store)
    }

    /// Create a trust store from a PEM file path.
    pub fn from_pem_file(path: &Path) -> Result<Self, CertchkError> {
        let data = std::fs::read(path).map_err(|e| io_error_with_path(path, e))?;
        Self::from_pem(&data)
    }

    /// Add an anchor. Returns `false` if the exact same certificate is
    /// already present.
    pub fn add(&mut self, record: CertificateRecord) -> bool {
        if self.contains(&record) {
            return false;
        }
        let idx = self.anchors.len();
        self.by_subject
            .entry(record.subject.raw.clone())
            .or_default()
            .push(idx);
        self.anchors.push(record);
        true
    }

    /// Add all certificates from a PEM bundle. Returns the number added.
    pub fn add_pem_bundle(&mut self, pem_data: &[u8]) -> Result<usize, CertchkError> {
        let mut added = 0;
        for record in parse_pem_chain(pem_data)? {
            if self.add(record) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Load certificates from a directory of PEM files (like OpenSSL's
    /// `-CApath`). Unreadable or malformed files are skipped.
    pub fn add_pem_directory(&mut self, dir: &Path) -> Result<usize, CertchkError> {
        let mut total = 0;
        let entries = std::fs::read_dir(dir).map_err(|e| io_error_with_path(dir, e))?;
        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_pem_cert_file(&path) {
                paths.push(path);
            }
        }
        // read_dir order is platform-dependent; anchor order must not be.
        paths.sort();
        for path in paths {
            if let Ok(data) = std::fs::read(&path) {
                if let Ok(added) = self.add_pem_bundle(&data) {
                    total += added;
                }
            }
        }
        Ok(total)
    }

    /// Anchors whose subject matches the given raw name, in insertion order.
    pub fn find_by_subject_raw<'s>(
        &'s self,
        subject_raw: &[u8],
    ) -> impl Iterator<Item = &'s CertificateRecord> + 's {
        self.indices_by_subject(subject_raw)
            .iter()
            .filter_map(|&i| self.anchors.get(i))
    }

    pub(crate) fn indices_by_subject(&self, subject_raw: &[u8]) -> &[usize] {
        self.by_subject
            .get(subject_raw)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether this exact certificate (by DER encoding) is an anchor.
    pub fn contains(&self, record: &CertificateRecord) -> bool {
        self.find_by_subject_raw(&record.subject.raw)
            .any(|a| a.raw == record.raw)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CertificateRecord> {
        self.anchors.iter()
    }

    /// Number of certificates in the store.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl<'s> IntoIterator for &'s TrustStore {
    type Item = &'s CertificateRecord;
    type IntoIter = std::slice::Iter<'s, CertificateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let probe = openssl_probe::probe();
    if let Some(file) = probe.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
