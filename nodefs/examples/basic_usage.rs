use tempfile::tempdir;
use nodefs::common::checksum::{ChecksumAlgorithm, ChecksumMode};
use nodefs::storage::{LocalAdapter, MemoryAdapter};
use nodefs::{Feature, Filesystem, FilesystemConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. A filesystem on local disk, configured from JSON.
    let dir = tempdir()?;
    let config = FilesystemConfig::from_json_str(
        r#"{
            "name": "assets",
            "urlPrefixes": ["https://cdn1.example.com", "https://cdn2.example.com"],
            "checksum": { "algorithm": "sha256" }
        }"#,
    )?;
    let mut fs = Filesystem::from_config(&config, Box::new(LocalAdapter::new(dir.path())?))?;
    println!("Filesystem '{}' created.", fs.name());

    // --- Features ---
    for feature in Feature::ALL {
        println!("  supports {:<16} {}", feature.name(), fs.supports(feature));
    }

    // --- Write files and inspect nodes ---
    {
        let report = fs.write("docs/report.txt", b"Quarterly numbers")?;
        println!("\n{} ({} bytes, {})", report.path(), report.size()?, report.mime_type()?);
        println!("  checksum: {}", report.checksum()?);
        println!("  url:      {}", report.public_url()?);

        fs.write("images/logo.svg", b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>")?;
        let logo = fs.image("images/logo.svg")?;
        println!("\n{} is an image (vector: {})", logo.path(), logo.is_vector()?);

        let root = fs.directory("/")?;
        println!("\nEverything under the root:");
        for node in root.entries(true)? {
            println!("  [{:?}] {}", node.kind(), node.path());
        }

        // Not an image: the error says what was found instead.
        if let Err(err) = fs.image("docs/report.txt") {
            println!("\n{}", err);
        }
    }

    // --- Swap the backend, keep the URL decorator ---
    let previous = fs.swap(Box::new(MemoryAdapter::new()))?;
    println!("\nSwapped out {}.", previous.adapter_name());
    println!("  docs/report.txt still there: {}", fs.has("docs/report.txt")?);
    println!("  supports checksum: {}", fs.supports(Feature::Checksum));

    let note = fs.write("note.txt", b"kept in memory")?;
    let md5 = note.checksum_with(ChecksumAlgorithm::Md5, ChecksumMode::Content)?;
    println!("  note.txt md5 (streamed): {}", md5);
    println!("  note.txt url: {}", note.public_url()?);

    Ok(())
}
