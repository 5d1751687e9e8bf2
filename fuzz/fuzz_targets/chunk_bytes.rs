#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use rechunk::{ChunkConfig, Chunker};

fuzz_target!(|input: (u8, Vec<u8>)| {
    let (target, data) = input;
    let target = usize::from(target).max(1);
    let chunker = Chunker::new(ChunkConfig::new(target).unwrap()).unwrap();
    let data = Bytes::from(data);

    let whole = chunker.chunk_bytes(data.clone());

    // Verify: every chunk but the last is exactly the target size
    for (i, chunk) in whole.iter().enumerate() {
        if i < whole.len() - 1 {
            assert_eq!(chunk.len(), target);
        } else {
            assert!(!chunk.is_empty() && chunk.len() <= target);
        }
    }

    // Verify: offsets are contiguous and cover the input
    let mut expected_offset = 0u64;
    for chunk in &whole {
        assert_eq!(chunk.offset, expected_offset);
        expected_offset += chunk.len() as u64;
    }
    assert_eq!(expected_offset, data.len() as u64);

    // Verify: fragmentation does not change the output.
    // The first byte of the input picks the fragment size.
    let fragment_size = data.first().map_or(1, |b| usize::from(*b).max(1));
    let fragments: Vec<Bytes> = data
        .chunks(fragment_size)
        .map(|f| data.slice_ref(f))
        .collect();
    let streamed: Vec<_> = chunker
        .chunk_fragments(fragments.into_iter().map(Ok))
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(whole, streamed);
});
