//! Inspect, unpack and repack a UnityWebData container.
//!
//! This example demonstrates the container codec on its own:
//! - Detecting what a file is
//! - Peeling a Brotli or gzip layer
//! - Listing the entry table
//! - Unpacking to a sibling directory and packing it back
//!
//! # Usage
//!
//! ```bash
//! cargo run --example pack_unpack -- Build/WebGL.data.br
//! ```

use std::env;
use std::path::Path;

use splashpatch::codec::Compression;
use splashpatch::format::detect::{Classification, classify};
use splashpatch::pipeline::decompressed_path_for;
use splashpatch::{Archive, Result, pack, unpack};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <container>", args[0]);
        eprintln!();
        eprintln!("Lists a UnityWebData container, unpacks it next to itself and");
        eprintln!("packs the result into <container>.repacked.");
        std::process::exit(1);
    }

    let input = Path::new(&args[1]);
    let info = classify(input)?;
    println!("{}: {} (confidence {:.1})", input.display(), info.classification, info.confidence);

    let container = match info.classification {
        Classification::Compressed(compression) => decompress(compression, input)?,
        Classification::RawContainer => input.to_path_buf(),
        other => {
            eprintln!("Not a container: {other}");
            std::process::exit(1);
        }
    };

    let archive = Archive::open_path(&container)?;
    println!();
    println!("{:>10}  {:>10}  Name", "Offset", "Size");
    println!("{}", "-".repeat(50));
    for entry in archive.entries() {
        println!("{:>10}  {:>10}  {}", entry.offset, entry.size, entry.name());
    }
    println!("{}", "-".repeat(50));
    println!(
        "{} entries, {} payload bytes",
        archive.info().entry_count,
        archive.info().total_size
    );
    drop(archive);

    let directory = unpack(&container)?;
    println!();
    println!("Unpacked to {}", directory.display());

    let repacked = container.with_extension("repacked");
    pack(&directory, &repacked)?;
    println!("Repacked to {}", repacked.display());

    Ok(())
}

fn decompress(compression: Compression, input: &Path) -> Result<std::path::PathBuf> {
    let output = decompressed_path_for(input);
    println!("Decompressing {compression} layer to {}", output.display());
    compression.decompress_file(input, &output)
}
