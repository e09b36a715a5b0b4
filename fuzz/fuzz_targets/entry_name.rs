//! Fuzz target for ArchivePath::new with arbitrary string input.
//!
//! Accepted names must stay inside the extraction directory: no `..`
//! segment, no leading separator, no NUL byte.
//!
//! Run with: cargo +nightly fuzz run entry_name

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(name) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = splashpatch::ArchivePath::new(name) else {
        return;
    };

    let normalized = path.as_str();
    assert!(
        !normalized.split('/').any(|segment| segment == ".."),
        "parent segment accepted: {normalized:?}"
    );
    assert!(!normalized.starts_with('/'), "absolute name accepted: {normalized:?}");
    assert!(!normalized.contains('\0'), "NUL byte accepted: {normalized:?}");
});
