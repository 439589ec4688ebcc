use crate::foundation::error::{ReelError, ReelResult};

/// Split `items` into consecutive, order-preserving chunks of at most `max_per_chunk`.
///
/// Yields `ceil(len / max_per_chunk)` chunks; only the last may be shorter. An empty input
/// yields no chunks.
pub fn split_frames<T>(items: &[T], max_per_chunk: usize) -> ReelResult<Vec<&[T]>> {
    if max_per_chunk == 0 {
        return Err(ReelError::validation("max frames per segment must be > 0"));
    }
    Ok(items.chunks(max_per_chunk).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/chunk.rs"]
mod tests;
