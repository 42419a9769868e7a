use super::{classify_chunk, ContentChunk};

/// Confidence of a chunk when the content fit in one piece.
const WHOLE_CONFIDENCE: f64 = 1.0;
/// Confidence of each chunk of split content.
const SPLIT_CONFIDENCE: f64 = 0.9;

/// Split `content` into `ceil(len / chunk_size)` contiguous chunks.
///
/// Boundaries are byte offsets at multiples of `chunk_size`; one that lands
/// inside a multi-byte character moves back to that character's start, so
/// callers must pass a `chunk_size` of at least 4. A boundary moves back at
/// most 3 bytes, so every chunk is between `chunk_size - 3` (except the last)
/// and `chunk_size + 3` bytes.
pub fn chunk_content(
    file_id: &str,
    content: &str,
    chunk_size: usize,
    encoding: &str,
) -> Vec<ContentChunk> {
    let len = content.len();
    let chunk_size = chunk_size.max(4);

    if len <= chunk_size {
        return vec![make_chunk(
            file_id,
            0,
            content,
            0,
            len,
            encoding,
            WHOLE_CONFIDENCE,
        )];
    }

    let count = len.div_ceil(chunk_size);
    let mut bounds = Vec::with_capacity(count + 1);
    bounds.push(0);
    for k in 1..count {
        let mut b = k * chunk_size;
        while !content.is_char_boundary(b) {
            b -= 1;
        }
        bounds.push(b);
    }
    bounds.push(len);

    bounds
        .windows(2)
        .enumerate()
        .map(|(seq, w)| {
            make_chunk(
                file_id,
                seq,
                &content[w[0]..w[1]],
                w[0],
                w[1],
                encoding,
                SPLIT_CONFIDENCE,
            )
        })
        .collect()
}

fn make_chunk(
    file_id: &str,
    sequence: usize,
    slice: &str,
    start: usize,
    end: usize,
    encoding: &str,
    confidence: f64,
) -> ContentChunk {
    ContentChunk {
        id: format!("{}-chunk-{}", file_id, sequence),
        sequence,
        content: slice.to_string(),
        size: end - start,
        chunk_type: classify_chunk(slice),
        start,
        end,
        encoding: encoding.to_string(),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(chunks: &[ContentChunk], content: &str) {
        let mut cursor = 0;
        for (idx, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence, idx);
            assert_eq!(chunk.start, cursor);
            assert!(chunk.end >= chunk.start);
            assert_eq!(chunk.size, chunk.end - chunk.start);
            assert_eq!(chunk.content, &content[chunk.start..chunk.end]);
            cursor = chunk.end;
        }
        assert_eq!(cursor, content.len());
    }

    #[test]
    fn test_single_chunk_when_small() {
        let chunks = chunk_content("f1", "hello world", 1024, "utf-8");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].confidence, 1.0);
        assert_eq!(chunks[0].id, "f1-chunk-0");
        assert_partition(&chunks, "hello world");
    }

    #[test]
    fn test_split_counts_and_confidence() {
        let content = "a".repeat(25);
        let chunks = chunk_content("f1", &content, 10, "utf-8");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].size, 5);
        assert!(chunks.iter().all(|c| c.confidence == 0.9));
        assert_partition(&chunks, &content);
    }

    #[test]
    fn test_exact_multiple() {
        let content = "b".repeat(30);
        let chunks = chunk_content("f1", &content, 10, "utf-8");
        assert_eq!(chunks.len(), 3);
        assert_partition(&chunks, &content);
    }

    #[test]
    fn test_multibyte_boundaries_stay_contiguous() {
        let content = "héllo wörld ñandú ".repeat(40);
        let chunks = chunk_content("f1", &content, 16, "utf-8");
        assert_eq!(chunks.len(), content.len().div_ceil(16));
        assert_partition(&chunks, &content);
    }

    #[test]
    fn test_chunk_size_bounds() {
        let chunks = chunk_content("f", "aaaébbb", 4, "utf-8");
        let ranges: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
        assert_eq!(ranges, vec![(0, 3), (3, 8)]);

        let content = "\u{ff}\u{d8}\u{ff}ab\u{e0}".repeat(50);
        for size in [4, 5, 7, 16] {
            let chunks = chunk_content("f", &content, size, "binary");
            assert_eq!(chunks.len(), content.len().div_ceil(size));
            assert!(chunks.iter().all(|c| c.size <= size + 3));
            let (_, rest) = chunks.split_last().unwrap();
            assert!(rest.iter().all(|c| c.size + 3 >= size));
            assert_partition(&chunks, &content);
        }
    }

    #[test]
    fn test_empty_content_single_chunk() {
        let chunks = chunk_content("f1", "", 16, "utf-8");
        assert_eq!(chunks.len(), 1);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 0));
    }
}
