//! Fuzz target for header-based classification.
//!
//! Run with: cargo +nightly fuzz run detect

#![no_main]

use libfuzzer_sys::fuzz_target;
use splashpatch::format::detect::detect_bytes;

fuzz_target!(|data: &[u8]| {
    let info = detect_bytes(data, data.len() as u64);
    assert!((0.0..=1.0).contains(&info.confidence));
    if info.is_unknown() {
        assert_eq!(info.confidence, 0.0);
    }
});
