#![no_main]

use gsm_bts_core::l3::L3Header;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = L3Header::decode(data);
});
