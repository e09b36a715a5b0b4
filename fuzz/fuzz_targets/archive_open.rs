//! Fuzz target for Archive::open with arbitrary byte input.
//!
//! Any table that passes validation must describe payloads that lie inside
//! the input, so reading every entry must succeed.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let Ok(mut archive) = splashpatch::Archive::open(Cursor::new(data)) else {
        return;
    };

    let len = data.len() as u64;
    assert!(u64::from(archive.first_entry_offset()) <= len);
    for index in 0..archive.len() {
        let range = archive.entries()[index].range();
        assert!(range.end <= len, "entry {index} ends past the input");
        let payload = archive
            .read_entry(index)
            .expect("validated entry must be readable");
        assert_eq!(payload.len() as u64, range.end - range.start);
    }
});
