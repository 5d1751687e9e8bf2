//! Serve several attachments concurrently from async readers.
//!
//! Each download runs as its own task. Tokio files are adapted to
//! `futures_io::AsyncRead` with `tokio_util::compat`.
//!
//! Run with:
//!     cargo run --example async_serve --features async-io

use futures_util::StreamExt;
use rechunk::{Attachment, ChunkConfig, base64_response_async};
use tokio::io::AsyncWriteExt;
use tokio_util::compat::TokioAsyncReadCompatExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let dir = tempfile::tempdir()?;

    // Create a few attachments of different sizes
    let mut paths = Vec::new();
    for (i, size) in [10_000usize, 250_000, 1_000_000].into_iter().enumerate() {
        let path = dir.path().join(format!("attachment-{i}.bin"));
        let mut file = tokio::fs::File::create(&path).await?;
        let data: Vec<u8> = (0..size).map(|b| (b % 256) as u8).collect();
        file.write_all(&data).await?;
        file.flush().await?;
        paths.push(path);
    }

    println!("Serving {} attachments concurrently...\n", paths.len());

    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| tokio::spawn(serve(path)))
        .collect();

    for handle in handles {
        let (name, parts, encoded) = handle.await??;
        println!("{name}: {parts} chunks, {encoded} base64 bytes");
    }

    Ok(())
}

async fn serve(
    path: std::path::PathBuf,
) -> Result<(String, usize, usize), Box<dyn std::error::Error + Send + Sync>> {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("download.bin")
        .to_string();

    let file = tokio::fs::File::open(&path).await?;
    let attachment = Attachment::new(name.clone(), "application/octet-stream");
    let mut response = base64_response_async(&attachment, file.compat(), ChunkConfig::default())?;

    let mut parts = 0;
    let mut encoded = 0;
    while let Some(part) = response.body.next().await {
        encoded += part?.len();
        parts += 1;
    }

    Ok((name, parts, encoded))
}
