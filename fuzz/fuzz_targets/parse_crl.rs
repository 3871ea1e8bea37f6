#![no_main]

use certchk_lib::{parse_der_crl, parse_pem_crls};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(crl) = parse_der_crl(data) {
        let _ = crl.find(&[0x01]);
        for entry in &crl.revoked {
            let _ = crl.find(&entry.serial);
        }
    }
    let _ = parse_pem_crls(data);
});
