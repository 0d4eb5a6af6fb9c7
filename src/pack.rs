//! Packing helpers: bytes and strings to `u64` word arrays, and contiguous
//! storage for wide rows.
//!
//! Bytes are packed little-endian within each word: byte 0 lands in the low
//! 8 bits of word 0. A tail shorter than 8 bytes is zero-padded, so two
//! inputs that differ only in padding still differ in Hamming distance by
//! exactly their byte-wise difference.

/// Number of words needed to pack `n` bytes.
#[inline]
#[must_use]
pub fn packed_len(n: usize) -> usize {
    (n + 7) / 8
}

/// Packs a byte slice into words, zero-padding the final word.
#[must_use]
pub fn pack_bytes(data: &[u8]) -> Vec<u64> {
    let mut out = vec![0u64; packed_len(data.len())];
    pack_bytes_into(data, &mut out);
    out
}

/// Packs a byte slice into a caller-supplied word buffer.
///
/// # Panics
///
/// Panics if `out` is shorter than [`packed_len`] of the input.
pub fn pack_bytes_into(data: &[u8], out: &mut [u64]) {
    assert!(
        out.len() >= packed_len(data.len()),
        "output buffer too short for packed input"
    );
    let mut chunks = data.chunks_exact(8);
    for (o, chunk) in out.iter_mut().zip(chunks.by_ref()) {
        *o = u64::from_le_bytes(chunk.try_into().unwrap());
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut word = [0u8; 8];
        word[..tail.len()].copy_from_slice(tail);
        out[data.len() / 8] = u64::from_le_bytes(word);
    }
}

/// Unpacks words produced by [`pack_bytes`] back into `original_len` bytes.
#[must_use]
pub fn unpack_bytes(words: &[u64], original_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(original_len);
    for word in words {
        for b in word.to_le_bytes() {
            if out.len() == original_len {
                break;
            }
            out.push(b);
        }
    }
    out
}

/// Packs a string's UTF-8 bytes into words, zero-padding the final word.
#[must_use]
pub fn pack_str(data: &str) -> Vec<u64> {
    pack_bytes(data.as_bytes())
}

/// Unpacks words produced by [`pack_str`] back into a string.
///
/// # Panics
///
/// Panics if the unpacked bytes are not valid UTF-8 (i.e. if the words were
/// not produced by [`pack_str`] with the same length).
#[must_use]
pub fn unpack_string(words: &[u64], original_len: usize) -> String {
    String::from_utf8(unpack_bytes(words, original_len)).expect("packed words held valid UTF-8")
}

/// Fixed-width rows stored back-to-back in one contiguous allocation.
///
/// Jagged `Vec<Vec<u64>>` rows each live in their own allocation; scanning
/// them walks the heap. Re-packing into one flat word buffer keeps a wide
/// scan on sequential memory, which is what the batch-distance kernel
/// wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatVectors {
    words: Vec<u64>,
    width: usize,
}

impl FlatVectors {
    /// Copies jagged rows into contiguous storage.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not all share one width.
    #[must_use]
    pub fn from_rows(rows: &[Vec<u64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let mut words = Vec::with_capacity(width * rows.len());
        for row in rows {
            assert_eq!(row.len(), width, "all rows must share one width");
            words.extend_from_slice(row);
        }
        Self { words, width }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.words.len() / self.width
        }
    }

    /// True if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Words per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// The `i`th row.
    #[must_use]
    pub fn row(&self, i: usize) -> &[u64] {
        &self.words[i * self.width..(i + 1) * self.width]
    }

    /// Iterates over the rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &[u64]> {
        self.words.chunks_exact(self.width.max(1))
    }

    /// Copies the rows back out as jagged vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<u64>> {
        self.iter().map(<[u64]>::to_vec).collect()
    }
}
