//! Stable hashing for deterministic festive message selection.
//! Input format: `<festival_key>:<YYYY-MM-DD>`, e.g. `diwali:2026-11-08`

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a over raw bytes.
#[must_use]
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Pick a slot in `0..len` for a festival on a given ISO date.
///
/// Returns `None` when `len` is zero.
#[must_use]
pub fn festive_index(festival_key: &str, iso_date: &str, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let input = format!("{festival_key}:{iso_date}");
    let hash = fnv1a64(input.as_bytes());
    let len = u64::try_from(len).ok()?;
    usize::try_from(hash % len).ok()
}
