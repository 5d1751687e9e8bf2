#![no_main]

use std::io::{self, Read};

use libfuzzer_sys::fuzz_target;
use rechunk::{ChunkConfig, Chunker};

/// Reader that returns at most `step` bytes per call.
struct Trickle<'a> {
    data: &'a [u8],
    step: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.step).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fuzz_target!(|input: (u8, u8, u8, Vec<u8>)| {
    let (target, read_size, step, data) = input;
    let target = usize::from(target).max(1);
    let config = ChunkConfig::new(target)
        .unwrap()
        .with_read_size(usize::from(read_size).max(1));
    let chunker = Chunker::new(config).unwrap();

    let reader = Trickle {
        data: &data,
        step: usize::from(step).max(1),
    };
    let chunks: Vec<_> = chunker.chunk(reader).collect::<Result<_, _>>().unwrap();

    // Verify: same chunks as chunking the whole buffer at once
    assert_eq!(chunks, chunker.chunk_bytes(data.clone()));

    // Verify: concatenation reproduces the input
    let joined: Vec<u8> = chunks.iter().flat_map(|c| c.data.iter().copied()).collect();
    assert_eq!(joined, data);
});
