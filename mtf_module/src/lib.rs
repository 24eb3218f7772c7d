//! Move-to-Front transform over the full 16-bit code-unit alphabet.
//!
//! The recency list is an intrusive doubly-linked list over a
//! code-unit-indexed `prev`/`next` array rather than a flat `Vec` that gets
//! shifted on every symbol — a naive shift of up to 65536 elements per
//! symbol is prohibitive, and the linked list gives O(1) move-to-front at
//! the cost of an O(k) linear scan from the head to find a symbol's current
//! rank (the same asymptotic cost the naive shift pays, but without the
//! per-symbol memmove). See DESIGN.md for the tradeoff against a
//! Fenwick-tree/order-statistics structure.

use shared_files::constants::MTF_SHIFT_START;
use shared_files::{ALPHABET_SIZE, CodeUnit};

const NONE: i32 = -1;

/// Remaps a rank `k` onto a code unit via `(k + START) mod 65536`.
pub fn index_to_shifted_unit(k: u32) -> CodeUnit {
    (k as u16).wrapping_add(MTF_SHIFT_START)
}

/// Inverse of [`index_to_shifted_unit`]: `(c - START) mod 65536`.
pub fn shifted_unit_to_index(c: CodeUnit) -> u32 {
    c.wrapping_sub(MTF_SHIFT_START) as u32
}

/// Recency-ordered list over the full code-unit alphabet.
pub struct MoveToFront {
    prev: Vec<i32>,
    next: Vec<i32>,
    head: i32,
}

impl Default for MoveToFront {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveToFront {
    /// Builds a fresh codec in lexicographic order (0, 1, …, 65535).
    pub fn new() -> Self {
        let mut mtf = MoveToFront {
            prev: vec![NONE; ALPHABET_SIZE],
            next: vec![NONE; ALPHABET_SIZE],
            head: 0,
        };
        mtf.reset();
        mtf
    }

    /// Restores the list to lexicographic order.
    pub fn reset(&mut self) {
        let n = ALPHABET_SIZE;
        for c in 0..n {
            self.prev[c] = if c == 0 { NONE } else { (c - 1) as i32 };
            self.next[c] = if c + 1 == n { NONE } else { (c + 1) as i32 };
        }
        self.head = 0;
    }

    /// Finds the current rank of `c`, counting steps from the head.
    fn rank_of(&self, c: CodeUnit) -> u32 {
        let mut node = self.head;
        let mut rank = 0u32;
        while node != c as i32 {
            node = self.next[node as usize];
            rank += 1;
        }
        rank
    }

    /// Unlinks `c` from its current position and reinserts it at the head.
    fn promote(&mut self, c: CodeUnit) {
        let c = c as i32;
        if c == self.head {
            return;
        }
        let p = self.prev[c as usize];
        let n = self.next[c as usize];
        if p != NONE {
            self.next[p as usize] = n;
        }
        if n != NONE {
            self.prev[n as usize] = p;
        }
        self.prev[c as usize] = NONE;
        self.next[c as usize] = self.head;
        self.prev[self.head as usize] = c;
        self.head = c;
    }

    /// Encodes `c` as its current rank, then promotes it to the front.
    pub fn encode_raw(&mut self, c: CodeUnit) -> u32 {
        let rank = self.rank_of(c);
        self.promote(c);
        rank
    }

    /// Decodes a rank back into the code unit at that position, promoting it.
    pub fn decode_raw(&mut self, rank: u32) -> CodeUnit {
        let mut node = self.head;
        for _ in 0..rank {
            node = self.next[node as usize];
        }
        let c = node as CodeUnit;
        self.promote(c);
        c
    }

    /// Encodes `c` as a shifted code unit, keeping common low ranks mapped
    /// onto printable characters in the intermediate stream.
    pub fn encode_adapted(&mut self, c: CodeUnit) -> CodeUnit {
        let rank = self.encode_raw(c);
        index_to_shifted_unit(rank)
    }

    /// Inverse of [`Self::encode_adapted`].
    pub fn decode_adapted(&mut self, shifted: CodeUnit) -> CodeUnit {
        let rank = shifted_unit_to_index(shifted);
        self.decode_raw(rank)
    }

    /// Encodes a whole block, sharing this instance's list state across
    /// every code unit.
    pub fn transform(&mut self, source: &[CodeUnit]) -> Vec<CodeUnit> {
        source.iter().map(|&c| self.encode_adapted(c)).collect()
    }

    /// Decodes a whole block, sharing this instance's list state across
    /// every code unit.
    pub fn reverse(&mut self, encoded: &[CodeUnit]) -> Vec<CodeUnit> {
        encoded.iter().map(|&c| self.decode_adapted(c)).collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_holds_for_arbitrary_strings(
            units in proptest::collection::vec(0u16..=0xFFFFu16, 0..500)
        ) {
            let mut encoder = MoveToFront::new();
            let encoded = encoder.transform(&units);
            let mut decoder = MoveToFront::new();
            let decoded = decoder.reverse(&encoded);
            prop_assert_eq!(decoded, units);
        }
    }
}
