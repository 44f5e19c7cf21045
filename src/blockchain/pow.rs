use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::crypto::Hash256;

/// Cooperative cancellation flag polled by the nonce search. Clones share the
/// same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Number of leading `0` characters in the hash's hex form.
pub fn leading_zero_nibbles(hash: &Hash256) -> u32 {
    let mut count = 0;
    for byte in hash.as_bytes() {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if byte >> 4 == 0 {
            count += 1;
        }
        break;
    }
    count
}

/// `16^(64 - difficulty)` as a big-endian 256-bit number. `None` for
/// difficulty 0, whose target (2^256) exceeds the hash space.
pub fn target(difficulty: u32) -> Option<[u8; 32]> {
    if difficulty == 0 {
        return None;
    }
    let bit = 4 * (64 - difficulty.min(64)) as usize;
    let mut t = [0u8; 32];
    t[31 - bit / 8] = 1 << (bit % 8);
    Some(t)
}

/// True when `hash`, read as a big-endian number, is below `target(difficulty)`.
pub fn meets_difficulty(hash: &Hash256, difficulty: u32) -> bool {
    leading_zero_nibbles(hash) >= difficulty
}
