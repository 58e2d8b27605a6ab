//! Rule id generation
//!
//! Ids follow `rule-{millis}-{6 hex}`. The suffix is a Murmur3 hash of the
//! record's position and URL pattern, so recompiling the same store yields
//! the same ids.

const ID_SEED: u32 = 0x9e3779b9;

/// Murmur3 32-bit hash.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    let len = data.len();
    let mut h = seed;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(0xcc9e2d51);
        k = k.rotate_left(15);
        k = k.wrapping_mul(0x1b873593);

        h ^= k;
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k: u32 = 0;
        for (i, &b) in tail.iter().enumerate() {
            k ^= (b as u32) << (8 * i);
        }
        k = k.wrapping_mul(0xcc9e2d51);
        k = k.rotate_left(15);
        k = k.wrapping_mul(0x1b873593);
        h ^= k;
    }

    // Finalization
    h ^= len as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;

    h
}

/// Build an id for a record that has none.
pub fn generate_id(now_ms: u64, index: usize, url_pattern: &str) -> String {
    let mut key = Vec::with_capacity(url_pattern.len() + 8);
    key.extend_from_slice(&(index as u64).to_le_bytes());
    key.extend_from_slice(url_pattern.as_bytes());
    let suffix = murmur3_32(&key, ID_SEED) & 0x00ff_ffff;
    format!("rule-{}-{:06x}", now_ms, suffix)
}
