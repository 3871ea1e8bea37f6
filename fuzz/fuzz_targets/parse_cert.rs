#![no_main]

use certchk_lib::{
    parse_cert, parse_pem_chain, verify_certificate_with_options, Profile, TrustStore,
    VerifyOptions,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Neither the parser nor the verifier may panic, regardless of input.
    if let Ok(cert) = parse_cert(data) {
        let _ = cert.serial_hex();
        let _ = cert.short_name();
        let _ = cert.fingerprint();

        let options = VerifyOptions {
            at_time: Some(1_700_000_000),
            expected_name: Some("example.com"),
            ..Default::default()
        };
        let store = TrustStore::from_records([cert.clone()]);
        for profile in [Profile::modern(), Profile::suite_b()] {
            let _ = verify_certificate_with_options(&cert, &[], &store, &profile, &options);
            let _ = verify_certificate_with_options(
                &cert,
                std::slice::from_ref(&cert),
                &TrustStore::new(),
                &profile,
                &options,
            );
        }
    }

    // A bundle: first certificate is the subject, the rest form the pool
    // and, separately, the trust store.
    if let Ok(certs) = parse_pem_chain(data) {
        if let Some((subject, rest)) = certs.split_first() {
            let store = TrustStore::from_records(rest.iter().cloned());
            let options = VerifyOptions {
                at_time: Some(1_700_000_000),
                ..Default::default()
            };
            let _ = verify_certificate_with_options(
                subject,
                rest,
                &store,
                &Profile::compatibility(),
                &options,
            );
        }
    }
});
