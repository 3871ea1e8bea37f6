//! Incremental CRC-32 (IEEE) accumulator used for integrity checks.
//!
//! The state is threaded through [`update`] calls by the caller. Feeding the
//! same bytes in one call or split across any number of calls yields the
//! same final state.

/// Seed state before any byte has been fed.
pub const INITIAL_STATE: u32 = 0;

/// Fold `buffer` into `state` and return the new state.
pub fn update(state: u32, buffer: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(state);
    hasher.update(buffer);
    hasher.finalize()
}

/// Checksum of a whole buffer.
pub fn of(buffer: &[u8]) -> u32 {
    update(INITIAL_STATE, buffer)
}
