#![no_main]

use gsm_bts_core::bitvec::BitVector;
use gsm_bts_core::l2::{L2Frame, Primitive};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let bv = BitVector::from_bytes(data.to_vec());
    let _ = L2Frame::from_bitvector(&bv, Primitive::L2Data);
});
