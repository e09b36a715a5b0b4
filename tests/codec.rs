//! Compression layer and detection tests.

mod common;

use std::fs;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use splashpatch::codec::{Compression, CompressionLevel};
use splashpatch::format::BROTLI_MARKER;
use splashpatch::format::detect::{Classification, classify};
use splashpatch::{Error, pack};

fn sample() -> Vec<u8> {
    (0..20_000u32).map(|i| (i % 251) as u8 ^ (i / 97) as u8).collect()
}

#[test]
fn test_file_round_trip_both_variants() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    fs::write(&plain, sample()).unwrap();

    for compression in [Compression::Brotli, Compression::Gzip] {
        for level in [CompressionLevel::Smallest, CompressionLevel::Optimal] {
            let packed = dir.path().join(format!("plain.bin.{}", compression.extension()));
            let unpacked = dir.path().join("restored.bin");
            compression.compress_file(&plain, &packed, level).unwrap();
            compression.decompress_file(&packed, &unpacked).unwrap();
            assert_eq!(fs::read(&unpacked).unwrap(), sample(), "{compression} {level:?}");
            fs::remove_file(&packed).unwrap();
            fs::remove_file(&unpacked).unwrap();
        }
    }
}

#[test]
fn test_incompressible_data_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut data = vec![0u8; 256 * 1024];
    rng.fill(&mut data[..]);

    for compression in [Compression::Brotli, Compression::Gzip] {
        let packed = compression
            .compress_bytes(&data, CompressionLevel::Optimal)
            .unwrap();
        assert_eq!(compression.decompress_bytes(&packed).unwrap(), data, "{compression}");
    }
}

#[test]
fn test_corrupt_stream_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.gz");
    let mut bytes = Compression::Gzip
        .compress_bytes(&sample(), CompressionLevel::Optimal)
        .unwrap();
    bytes.truncate(bytes.len() / 2);
    fs::write(&input, bytes).unwrap();
    let before = common::listing(dir.path());

    let output = dir.path().join("broken");
    let err = common::expect_err(Compression::Gzip.decompress_file(&input, &output));
    assert!(matches!(
        err,
        Error::Compression {
            format: Compression::Gzip,
            ..
        }
    ));
    assert_eq!(common::listing(dir.path()), before);
}

#[test]
fn test_truncated_brotli_is_an_error() {
    let bytes = Compression::Brotli
        .compress_bytes(&sample(), CompressionLevel::Optimal)
        .unwrap();
    let err = common::expect_err(Compression::Brotli.decompress_bytes(&bytes[..bytes.len() / 2]));
    assert!(matches!(
        err,
        Error::Compression {
            format: Compression::Brotli,
            ..
        }
    ));
}

#[test]
fn test_decompress_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = common::expect_err(
        Compression::Brotli.decompress_file(&dir.path().join("none.br"), &dir.path().join("none")),
    );
    assert!(matches!(err, Error::NotFound { .. }));
}

// =============================================================================
// Detection on Disk
// =============================================================================

#[test]
fn test_classify_real_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("src");
    common::write_tree(&source, &[("data.unity3d", b"UnityFS\0body")]);
    let container = dir.path().join("Build.data");
    pack(&source, &container).unwrap();

    let info = classify(&container).unwrap();
    assert_eq!(info.classification, Classification::RawContainer);
    assert_eq!(info.confidence, 1.0);

    let gz = dir.path().join("Build.data.unityweb");
    Compression::Gzip
        .compress_file(&container, &gz, CompressionLevel::Optimal)
        .unwrap();
    assert_eq!(
        classify(&gz).unwrap().classification,
        Classification::Compressed(Compression::Gzip)
    );

    let br = dir.path().join("Build.data.br");
    Compression::Brotli
        .compress_file(&container, &br, CompressionLevel::Optimal)
        .unwrap();
    let info = classify(&br).unwrap();
    assert_eq!(info.classification, Classification::Compressed(Compression::Brotli));
    assert_eq!(info.confidence, 0.5);

    let asset = dir.path().join("level0");
    fs::write(&asset, common::serialized_asset(b"objects")).unwrap();
    let info = classify(&asset).unwrap();
    assert_eq!(info.classification, Classification::RawAsset);
    assert_eq!(info.confidence, 0.7);
}

#[test]
fn test_classify_marked_brotli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Build.data.unityweb");
    let mut bytes = vec![0x6B, 0x8D, 0x00];
    bytes.extend_from_slice(BROTLI_MARKER);
    bytes.extend_from_slice(&[0u8; 16]);
    fs::write(&path, bytes).unwrap();

    let info = classify(&path).unwrap();
    assert_eq!(info.classification, Classification::Compressed(Compression::Brotli));
    assert_eq!(info.confidence, 1.0);
}

#[test]
fn test_classify_zeros_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blob.bin");
    fs::write(&path, [0u8; 4096]).unwrap();
    assert!(classify(&path).unwrap().is_unknown());
}

#[test]
fn test_classify_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = common::expect_err(classify(&dir.path().join("missing")));
    assert!(matches!(err, Error::NotFound { .. }));
}
