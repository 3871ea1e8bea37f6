#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Behavioural properties of path verification over synthetic records.

mod common;

use certchk_lib::*;
use common::*;

fn options<'a>() -> VerifyOptions<'a> {
    VerifyOptions {
        at_time: Some(NOW),
        verifier: Some(&FakeVerifier),
        ..Default::default()
    }
}

fn verify(
    subject: &CertificateRecord,
    pool: &[CertificateRecord],
    store: &TrustStore,
    profile: &Profile,
) -> VerificationResult {
    verify_certificate_with_options(subject, pool, store, profile, &options()).unwrap()
}

// ---------------------------------------------------------------------------
// End-to-end scenario
// ---------------------------------------------------------------------------

#[test]
fn allowed_chain_succeeds_with_no_flags() {
    let pki = synthetic_pki();
    let store = TrustStore::from_records([pki.root.clone()]);
    let result = verify(&pki.leaf, &[pki.int.clone()], &store, &Profile::modern());
    assert_eq!(result.status, Status::Success);
    assert!(result.flags.is_empty());
}

#[test]
fn excluding_the_signing_hash_sets_only_weak_hash() {
    let pki = synthetic_pki();
    let store = TrustStore::from_records([pki.root.clone()]);
    let profile = Profile::modern().without_hash(HashAlgorithm::Sha256);
    let result = verify(&pki.leaf, &[pki.int.clone()], &store, &profile);
    assert_eq!(result.status, Status::Failure);
    assert_eq!(result.flags, VerifyFlags::WEAK_HASH);
}

#[test]
fn default_entry_point_uses_current_time() {
    let mut pki = synthetic_pki();
    // Fixtures are valid around a fixed instant in 2023; widen the window.
    pki.leaf.validity.not_after = i64::MAX;
    pki.leaf.validity.not_before = 0;
    let store = TrustStore::new();
    let result = verify_certificate(&pki.leaf, &[], &store, &Profile::modern()).unwrap();
    assert_eq!(result.flags, VerifyFlags::NOT_TRUSTED);
}

// ---------------------------------------------------------------------------
// Profile monotonicity
// ---------------------------------------------------------------------------

#[test]
fn relaxing_the_profile_never_adds_weak_hash() {
    let strict = Profile::modern();
    let relaxed = Profile::compatibility();
    assert!(strict.hashes_subset_of(&relaxed));

    for hash in HashAlgorithm::ALL {
        let pki = synthetic_pki_with_hash(hash);
        let store = TrustStore::from_records([pki.root.clone()]);
        let pool = [pki.int.clone()];
        let under_strict = verify(&pki.leaf, &pool, &store, &strict);
        let under_relaxed = verify(&pki.leaf, &pool, &store, &relaxed);

        if under_strict.is_valid() {
            assert!(under_relaxed.is_valid(), "{} accepted by modern only", hash);
        }
        if !under_strict.flags.contains(VerifyFlags::WEAK_HASH) {
            assert!(!under_relaxed.flags.contains(VerifyFlags::WEAK_HASH));
        }
        // Only the hash verdict may differ between the two profiles.
        let mut a = under_strict.flags;
        let mut b = under_relaxed.flags;
        a.remove(VerifyFlags::WEAK_HASH);
        b.remove(VerifyFlags::WEAK_HASH);
        assert_eq!(a, b, "{}", hash);
    }
}

#[test]
fn sha1_needs_the_compatibility_profile() {
    let pki = synthetic_pki_with_hash(HashAlgorithm::Sha1);
    let store = TrustStore::from_records([pki.root.clone()]);
    let pool = [pki.int.clone()];
    assert_eq!(
        verify(&pki.leaf, &pool, &store, &Profile::modern()).flags,
        VerifyFlags::WEAK_HASH
    );
    assert!(verify(&pki.leaf, &pool, &store, &Profile::compatibility()).is_valid());
}

#[test]
fn md5_is_never_trusted() {
    let pki = synthetic_pki_with_hash(HashAlgorithm::Md5);
    let store = TrustStore::from_records([pki.root.clone()]);
    let everything = Profile::compatibility().with_hash(HashAlgorithm::Md5);
    let result = verify(&pki.leaf, &[pki.int.clone()], &store, &everything);
    assert_eq!(result.status, Status::Failure);
    assert!(result.flags.contains(VerifyFlags::NOT_TRUSTED));
    assert!(result.flags.contains(VerifyFlags::BAD_SIGNATURE));
    assert!(!result.flags.contains(VerifyFlags::WEAK_HASH));
}

// ---------------------------------------------------------------------------
// Cycle rejection
// ---------------------------------------------------------------------------

#[test]
fn self_issued_non_anchor_is_untrusted() {
    let x = self_signed(ca("X", "X"));
    let store = TrustStore::from_records([self_signed(ca("Root", "Root"))]);
    let result = verify(&x, &[x.clone()], &store, &Profile::modern());
    assert_eq!(result.status, Status::Failure);
    assert_eq!(result.flags, VerifyFlags::NOT_TRUSTED);
    assert_eq!(result.chain.len(), 1);
}

#[test]
fn issuer_loop_terminates() {
    let a_key = ca("A", "C");
    let b_key = ca("B", "A");
    let c_key = ca("C", "B");
    let a = signed_by(a_key.clone(), &c_key);
    let b = signed_by(b_key.clone(), &a_key);
    let c = signed_by(c_key, &b_key);
    let leaf = signed_by(record("leaf", "A"), &a);
    let pool = [a, b, c];
    let result = verify(&leaf, &pool, &TrustStore::new(), &Profile::modern());
    assert_eq!(result.flags, VerifyFlags::NOT_TRUSTED);
    assert_eq!(result.chain.len(), 4);
}

// ---------------------------------------------------------------------------
// Temporal boundary
// ---------------------------------------------------------------------------

#[test]
fn validity_bounds_are_inclusive() {
    let pki = synthetic_pki();
    let store = TrustStore::from_records([pki.root.clone()]);
    let pool = [pki.int.clone()];
    let t0 = pki.leaf.validity.not_before;
    let t1 = pki.leaf.validity.not_after;
    let at = |t: i64| {
        let opts = VerifyOptions {
            at_time: Some(t),
            ..options()
        };
        verify_certificate_with_options(&pki.leaf, &pool, &store, &Profile::modern(), &opts)
            .unwrap()
            .flags
    };
    assert!(at(t0).is_empty());
    assert!(at(t1).is_empty());
    assert!(at((t0 + t1) / 2).is_empty());
    assert!(at(t0 - 1).contains(VerifyFlags::NOT_YET_VALID));
    assert!(at(t1 + 1).contains(VerifyFlags::EXPIRED));
}

// ---------------------------------------------------------------------------
// Flag additivity
// ---------------------------------------------------------------------------

#[test]
fn simultaneous_defects_are_all_reported() {
    let root = self_signed(ca("Root", "Root"));
    let mut leaf = record("leaf", "Root");
    leaf.validity.not_after = NOW - 1;
    leaf.signature_algorithm.hash = Some(HashAlgorithm::Sha1);
    leaf.public_key.algorithm = Some(KeyAlgorithm::Rsa);
    leaf.public_key.curve = None;
    leaf.public_key.bits = 1024;
    let leaf = signed_by(leaf, &root);
    let store = TrustStore::from_records([root]);
    let result = verify(&leaf, &[], &store, &Profile::modern());
    assert_eq!(
        result.flags,
        VerifyFlags::EXPIRED | VerifyFlags::WEAK_HASH | VerifyFlags::WEAK_KEY
    );
}

#[test]
fn chain_flags_are_the_union_of_certificate_flags() {
    let root = self_signed(ca("Root", "Root"));
    let mut int = ca("Int", "Root");
    int.basic_constraints = None;
    int.validity.not_before = NOW + 1;
    let int = signed_by(int, &root);
    let mut leaf = record("leaf", "Int");
    leaf.public_key.curve = Some(Curve::Secp256k1);
    let leaf = signed_by(leaf, &int);
    let store = TrustStore::from_records([root]);
    let result = verify(&leaf, &[int], &store, &Profile::suite_b());

    assert_eq!(result.chain[0].flags, VerifyFlags::BAD_CURVE);
    assert_eq!(
        result.chain[1].flags,
        VerifyFlags::NOT_CA | VerifyFlags::NOT_YET_VALID
    );
    let union = result
        .chain
        .iter()
        .fold(VerifyFlags::empty(), |acc, c| acc | c.flags);
    assert_eq!(result.flags, union);
    assert_eq!(result.status, Status::Failure);
}

#[test]
fn path_length_constraint_is_enforced() {
    let mut root = ca("Root", "Root");
    root.basic_constraints = Some(BasicConstraints {
        ca: true,
        path_len: Some(0),
    });
    let root = self_signed(root);
    let int = signed_by(ca("Int", "Root"), &root);
    let leaf = signed_by(record("leaf", "Int"), &int);
    let store = TrustStore::from_records([root]);
    let result = verify(&leaf, &[int], &store, &Profile::modern());
    assert_eq!(result.flags, VerifyFlags::PATH_LENGTH_EXCEEDED);
    assert_eq!(result.chain[2].flags, VerifyFlags::PATH_LENGTH_EXCEEDED);
}

// ---------------------------------------------------------------------------
// Revocation
// ---------------------------------------------------------------------------

fn crl_for(issuer: &CertificateRecord, serials: &[&[u8]]) -> CrlRecord {
    let mut crl = CrlRecord {
        issuer: issuer.subject.clone(),
        this_update: NOW - DAY,
        next_update: Some(NOW + DAY),
        revoked: serials
            .iter()
            .map(|s| RevokedEntry {
                serial: s.to_vec(),
                revocation_date: NOW - DAY,
            })
            .collect(),
        signature_algorithm: SignatureAlgorithm::new(KeyAlgorithm::Ec, HashAlgorithm::Sha256),
        tbs: format!("crl by {}", issuer.subject).into_bytes(),
        ..Default::default()
    };
    crl.signature = fake_signature(&crl.tbs, crl.signature_algorithm, &issuer.public_key);
    crl
}

#[test]
fn revoked_leaf_fails() {
    let pki = synthetic_pki();
    let store = TrustStore::from_records([pki.root.clone()]);
    let crls = [crl_for(&pki.int, &[pki.leaf.serial.as_slice()])];
    let opts = VerifyOptions {
        crls: &crls,
        ..options()
    };
    let pool = [pki.int.clone()];
    let result =
        verify_certificate_with_options(&pki.leaf, &pool, &store, &Profile::modern(), &opts)
            .unwrap();
    assert_eq!(result.status, Status::Failure);
    assert_eq!(result.flags, VerifyFlags::REVOKED);
    assert_eq!(result.chain[0].flags, VerifyFlags::REVOKED);
}

#[test]
fn crl_for_unrelated_serial_passes() {
    let pki = synthetic_pki();
    let store = TrustStore::from_records([pki.root.clone()]);
    let crls = [crl_for(&pki.int, &[b"someone else".as_slice()])];
    let opts = VerifyOptions {
        crls: &crls,
        ..options()
    };
    let pool = [pki.int.clone()];
    let result =
        verify_certificate_with_options(&pki.leaf, &pool, &store, &Profile::modern(), &opts)
            .unwrap();
    assert!(result.is_valid());
}

// ---------------------------------------------------------------------------
// Callback
// ---------------------------------------------------------------------------

#[test]
fn callback_is_identity_by_default_and_may_clear() {
    let pki = synthetic_pki_with_hash(HashAlgorithm::Sha1);
    let store = TrustStore::from_records([pki.root.clone()]);
    let pool = [pki.int.clone()];
    let identity = |_: &CertificateRecord, _: usize, f: VerifyFlags| f;
    let opts = VerifyOptions {
        callback: Some(&identity),
        ..options()
    };
    let with_identity =
        verify_certificate_with_options(&pki.leaf, &pool, &store, &Profile::modern(), &opts)
            .unwrap();
    assert_eq!(with_identity, verify(&pki.leaf, &pool, &store, &Profile::modern()));

    let accept_sha1 = |_: &CertificateRecord, _: usize, mut f: VerifyFlags| {
        f.remove(VerifyFlags::WEAK_HASH);
        f
    };
    let opts = VerifyOptions {
        callback: Some(&accept_sha1),
        ..options()
    };
    let result =
        verify_certificate_with_options(&pki.leaf, &pool, &store, &Profile::modern(), &opts)
            .unwrap();
    assert!(result.is_valid());
}

#[test]
fn clearing_not_trusted_does_not_create_trust() {
    let pki = synthetic_pki();
    let clear_all = |_: &CertificateRecord, _: usize, _: VerifyFlags| VerifyFlags::empty();
    let opts = VerifyOptions {
        callback: Some(&clear_all),
        ..options()
    };
    let result = verify_certificate_with_options(
        &pki.leaf,
        &[pki.int.clone()],
        &TrustStore::new(),
        &Profile::modern(),
        &opts,
    )
    .unwrap();
    assert!(result.flags.is_empty());
    assert_eq!(result.status, Status::Failure);
}

// ---------------------------------------------------------------------------
// Checksum restart equivalence
// ---------------------------------------------------------------------------

#[test]
fn checksum_split_points_agree() {
    let bytes: [u8; 8] = [0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7];
    let whole = checksum::update(checksum::INITIAL_STATE, &bytes);
    let (head, tail) = bytes.split_at(4);
    let halves = checksum::update(checksum::update(checksum::INITIAL_STATE, head), tail);
    assert_eq!(whole, halves);
    for split in 0..=bytes.len() {
        let (a, b) = bytes.split_at(split);
        let s = checksum::update(checksum::update(checksum::INITIAL_STATE, a), b);
        assert_eq!(s, whole, "split at {}", split);
    }
}
