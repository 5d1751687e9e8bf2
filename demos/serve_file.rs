//! Serve a file as a chunked base64 download.
//!
//! Prints the response headers, then one line per transfer chunk.
//!
//! Run with:
//!     cargo run --example serve_file -- /path/to/file

use std::env;
use std::fs::File;
use std::path::Path;

use rechunk::{Attachment, ChunkConfig, base64_response};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "Cargo.toml".to_string());

    let file = File::open(&path)?;
    let size = file.metadata()?.len();

    let file_name = Path::new(&path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download.bin");
    let attachment = Attachment::new(file_name, "");

    let response = base64_response(&attachment, file, ChunkConfig::default())?;

    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    println!();

    let mut parts = 0;
    let mut encoded_bytes = 0;
    for part in response.body {
        let part = part?;
        parts += 1;
        encoded_bytes += part.len();
        println!("{:x}\r", part.len());
    }

    println!(
        "\n{} bytes served as {} base64 bytes in {} chunks",
        size, encoded_bytes, parts
    );

    Ok(())
}
