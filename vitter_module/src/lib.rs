//! Adaptive Huffman coding following Vitter's algorithm: encoder and decoder
//! maintain identical dynamic trees, updating them symbol by symbol as each
//! code unit is transmitted or received, with no separate frequency pass and
//! no transmitted tree.
//!
//! The tree lives in flat arrays indexed by node number rather than as a
//! pointer/`Box` structure, in the spirit of the other engines here — but
//! unlike the static codec's pre-order-serialised tree, nothing about this
//! tree ever reaches the wire; only the bits it decides to emit for each
//! symbol do. Node numbers are allocated by a simple bump counter and
//! reshuffled by explicit parent/child swaps as weights change, rather than
//! by the tighter block-leader/`rtChild`-only bookkeeping a maximally compact
//! implementation would use — see `DESIGN.md` for the tradeoff.
//!
//! A still-unseen code unit is represented by a single shared not-yet-
//! transmitted (NYT) leaf. The first time a code unit appears, its node
//! transmits a binary-encoded index into the shrinking pool of unseen code
//! units (a phased binary code, `E`/`R` chosen so the pool of size `M` is
//! covered in `E` or `E+1` bits) instead of walking a path that doesn't yet
//! exist for it.

use bitstream_module::{BitReader, BitWriter};
use shared_files::errors::{JpackError, JpackResult};
use shared_files::{ALPHABET_SIZE, CodeUnit};

const NONE: u32 = 0;

/// Adaptive Huffman tree shared by the encoder and decoder. Both sides must
/// perform the exact same sequence of `encode_and_transmit`/
/// `decode_and_receive` calls against freshly constructed, independently
/// initialised trees for the stream to round-trip.
pub struct VitterTree {
    weight: Vec<u64>,
    parent: Vec<u32>,
    left: Vec<u32>,
    right: Vec<u32>,
    symbol: Vec<Option<CodeUnit>>,

    rep: Vec<u32>,
    seen: Vec<bool>,

    root: u32,
    nyt_node: u32,
    next_alloc: u32,

    /// code unit -> its current rank (1..=m) among the as-yet-unseen pool.
    nyt_rank_of: Vec<u32>,
    /// rank (1..=n) -> the code unit currently occupying that rank.
    symbol_at_rank: Vec<CodeUnit>,

    m: u32,
    e: u32,
    r: u32,
}

impl Default for VitterTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VitterTree {
    pub fn new() -> Self {
        let n = ALPHABET_SIZE as u32;
        let z = 2 * n - 1;
        let cap = (z + 1) as usize;

        let mut tree = VitterTree {
            weight: vec![0; cap],
            parent: vec![NONE; cap],
            left: vec![NONE; cap],
            right: vec![NONE; cap],
            symbol: vec![None; cap],
            rep: vec![NONE; n as usize],
            seen: vec![false; n as usize],
            root: 1,
            nyt_node: 1,
            next_alloc: 2,
            nyt_rank_of: (1..=n).collect(),
            symbol_at_rank: std::iter::once(0).chain(0..n as u16).collect(),
            m: n,
            e: 0,
            r: 0,
        };
        tree.recompute_e_r();
        tree
    }

    fn recompute_e_r(&mut self) {
        if self.m == 0 {
            self.e = 0;
            self.r = 0;
            return;
        }
        self.e = 31 - self.m.leading_zeros();
        self.r = self.m - (1 << self.e);
    }

    fn is_leaf(&self, node: u32) -> bool {
        self.left[node as usize] == NONE && self.right[node as usize] == NONE
    }

    fn alloc_node(&mut self) -> u32 {
        let id = self.next_alloc;
        self.next_alloc += 1;
        id
    }

    fn is_ancestor(&self, ancestor: u32, node: u32) -> bool {
        let mut cur = self.parent[node as usize];
        while cur != NONE {
            if cur == ancestor {
                return true;
            }
            cur = self.parent[cur as usize];
        }
        false
    }

    fn related(&self, a: u32, b: u32) -> bool {
        self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    /// Relabels nodes `a` and `b`: whatever subtree or leaf was reachable
    /// under number `a` becomes reachable under `b` and vice versa. `a` and
    /// `b` must not be in an ancestor/descendant relationship.
    fn swap_nodes(&mut self, a: u32, b: u32) {
        if a == b {
            return;
        }
        let pa = self.parent[a as usize];
        let pb = self.parent[b as usize];

        if pa == pb {
            if pa != NONE {
                let p = pa as usize;
                let (old_left, old_right) = (self.left[p], self.right[p]);
                self.left[p] = if old_left == a { b } else { a };
                self.right[p] = if old_right == a { b } else { a };
            }
        } else {
            if pa != NONE {
                if self.left[pa as usize] == a {
                    self.left[pa as usize] = b;
                } else {
                    self.right[pa as usize] = b;
                }
            }
            if pb != NONE {
                if self.left[pb as usize] == b {
                    self.left[pb as usize] = a;
                } else {
                    self.right[pb as usize] = a;
                }
            }
        }

        let (la, ra) = (self.left[a as usize], self.right[a as usize]);
        let (lb, rb) = (self.left[b as usize], self.right[b as usize]);
        if la != NONE {
            self.parent[la as usize] = b;
        }
        if ra != NONE {
            self.parent[ra as usize] = b;
        }
        if lb != NONE {
            self.parent[lb as usize] = a;
        }
        if rb != NONE {
            self.parent[rb as usize] = a;
        }

        self.weight.swap(a as usize, b as usize);
        self.symbol.swap(a as usize, b as usize);
        self.left.swap(a as usize, b as usize);
        self.right.swap(a as usize, b as usize);
        self.parent.swap(a as usize, b as usize);

        if let Some(c) = self.symbol[a as usize] {
            self.rep[c as usize] = a;
        }
        if let Some(c) = self.symbol[b as usize] {
            self.rep[c as usize] = b;
        }
        if self.root == a {
            self.root = b;
        } else if self.root == b {
            self.root = a;
        }
        if self.nyt_node == a {
            self.nyt_node = b;
        } else if self.nyt_node == b {
            self.nyt_node = a;
        }
    }

    /// The highest-numbered allocated node with the given weight, excluding
    /// `node` itself and any of its ancestors or descendants.
    fn highest_numbered_peer(&self, node: u32, weight: u64) -> Option<u32> {
        let max_allocated = self.next_alloc - 1;
        for candidate in (1..=max_allocated).rev() {
            if candidate == node {
                continue;
            }
            if self.weight[candidate as usize] != weight {
                continue;
            }
            if self.related(node, candidate) {
                continue;
            }
            return Some(candidate);
        }
        None
    }

    /// Climbs from `node` to the root, swapping each node to the front of
    /// its weight class (if it isn't already there) before incrementing its
    /// weight by one, preserving the invariant that ascending node number
    /// tracks non-decreasing weight.
    fn increment_node(&mut self, node: u32) {
        let mut current = node;
        loop {
            let w = self.weight[current as usize];
            if let Some(leader) = self.highest_numbered_peer(current, w) {
                self.swap_nodes(current, leader);
                current = leader;
            }
            self.weight[current as usize] += 1;
            let p = self.parent[current as usize];
            if p == NONE {
                break;
            }
            current = p;
        }
    }

    /// Removes `c` from the not-yet-transmitted pool and gives it a real
    /// leaf, splitting the shared NYT node into an internal node plus a
    /// (possibly final) new NYT leaf.
    fn graduate(&mut self, c: CodeUnit) {
        let rank = self.nyt_rank_of[c as usize];
        let last_rank = self.m;
        let displaced = self.symbol_at_rank[last_rank as usize];
        self.symbol_at_rank[rank as usize] = displaced;
        self.nyt_rank_of[displaced as usize] = rank;

        self.seen[c as usize] = true;
        self.m -= 1;
        self.recompute_e_r();

        let old_nyt = self.nyt_node;

        if self.m > 0 {
            let new_internal = self.alloc_node();
            let new_nyt = self.alloc_node();

            let parent_of_old = self.parent[old_nyt as usize];
            self.parent[new_internal as usize] = parent_of_old;
            if parent_of_old != NONE {
                if self.left[parent_of_old as usize] == old_nyt {
                    self.left[parent_of_old as usize] = new_internal;
                } else {
                    self.right[parent_of_old as usize] = new_internal;
                }
            } else {
                self.root = new_internal;
            }

            self.left[new_internal as usize] = new_nyt;
            self.right[new_internal as usize] = old_nyt;
            self.weight[new_internal as usize] = 0;

            self.parent[new_nyt as usize] = new_internal;
            self.symbol[new_nyt as usize] = None;
            self.weight[new_nyt as usize] = 0;

            self.parent[old_nyt as usize] = new_internal;
            self.symbol[old_nyt as usize] = Some(c);
            self.rep[c as usize] = old_nyt;

            self.nyt_node = new_nyt;
        } else {
            self.symbol[old_nyt as usize] = Some(c);
            self.rep[c as usize] = old_nyt;
            self.nyt_node = NONE;
        }
    }

    /// Collects the root-to-leaf path to `start_node` and writes it, root
    /// bit first (`0` for a left branch, `1` for a right branch).
    fn write_path(&self, start_node: u32, writer: &mut BitWriter) {
        let mut bits = Vec::new();
        let mut cur = start_node;
        while self.parent[cur as usize] != NONE {
            let p = self.parent[cur as usize];
            bits.push(if self.left[p as usize] == cur { 0u8 } else { 1u8 });
            cur = p;
        }
        while let Some(bit) = bits.pop() {
            writer.write_bit(bit);
        }
    }

    /// Encodes and transmits a single code unit, updating the tree exactly
    /// as the matching `decode_and_receive` call will on the other side.
    pub fn encode_and_transmit(&mut self, c: CodeUnit, writer: &mut BitWriter) {
        if self.seen[c as usize] {
            let node = self.rep[c as usize];
            self.write_path(node, writer);
            self.increment_node(node);
            return;
        }

        self.write_path(self.nyt_node, writer);

        let k_full = self.nyt_rank_of[c as usize] - 1;
        if k_full < 2 * self.r {
            writer.write_bits(k_full as u64, self.e + 1);
        } else {
            writer.write_bits((k_full - self.r) as u64, self.e);
        }

        self.graduate(c);
        let node = self.rep[c as usize];
        self.increment_node(node);
    }

    /// Decodes and receives a single code unit from `reader`, updating the
    /// tree to match the sender's.
    pub fn decode_and_receive(&mut self, reader: &mut BitReader) -> JpackResult<CodeUnit> {
        let mut node = self.root;
        while !self.is_leaf(node) {
            let bit = reader.read_bit()?;
            node = if bit == 0 {
                self.left[node as usize]
            } else {
                self.right[node as usize]
            };
        }

        if let Some(c) = self.symbol[node as usize] {
            self.increment_node(node);
            return Ok(c);
        }

        let k = reader.read_bits(self.e)? as u32;
        let k_full = if k < self.r {
            let extra = reader.read_bit()? as u32;
            2 * k + extra
        } else {
            k + self.r
        };
        let rank = k_full + 1;
        let c = self.symbol_at_rank[rank as usize];

        self.graduate(c);
        let leaf = self.rep[c as usize];
        self.increment_node(leaf);
        Ok(c)
    }
}

/// Encodes every code unit of `source` in sequence against a fresh tree.
pub fn encode(source: &[CodeUnit]) -> Vec<u8> {
    let mut tree = VitterTree::new();
    let mut writer = BitWriter::new();
    for &c in source {
        tree.encode_and_transmit(c, &mut writer);
    }
    writer.close()
}

/// Decodes `len` code units from `bytes` against a fresh tree. Useful when
/// the caller already knows how many symbols to expect (as the unit tests
/// below do, matching two independently-initialised trees against each
/// other).
pub fn decode(bytes: Vec<u8>, len: usize) -> JpackResult<Vec<CodeUnit>> {
    let mut tree = VitterTree::new();
    let mut reader = BitReader::new(bytes);
    let mut output = Vec::with_capacity(len);
    for _ in 0..len {
        output.push(tree.decode_and_receive(&mut reader)?);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_units(s: &str) -> Vec<CodeUnit> {
        s.encode_utf16().collect()
    }

    fn from_units(u: &[CodeUnit]) -> String {
        String::from_utf16(u).unwrap()
    }

    #[test]
    fn round_trips_abracadabra_with_independent_trees() {
        let source = to_units("abracadabra");
        let mut encoder = VitterTree::new();
        let mut writer = BitWriter::new();
        for &c in &source {
            encoder.encode_and_transmit(c, &mut writer);
        }
        let bytes = writer.close();

        let mut decoder = VitterTree::new();
        let mut reader = BitReader::new(bytes);
        let mut decoded = Vec::new();
        for _ in 0..source.len() {
            decoded.push(decoder.decode_and_receive(&mut reader).unwrap());
        }

        assert_eq!(from_units(&decoded), "abracadabra");
    }

    #[test]
    fn first_symbols_raw_bits_match_its_sixteen_bit_value() {
        let mut encoder = VitterTree::new();
        let mut writer = BitWriter::new();
        let c = 'a' as CodeUnit;
        encoder.encode_and_transmit(c, &mut writer);
        let bytes = writer.close();

        // The very first transmission writes no path bits (the NYT node is
        // still the root) and the preamble is the raw 16-bit code unit.
        let first_byte_msb = (bytes[0] >> 7) & 1;
        let expected_msb = ((c as u16) >> 15) & 1;
        assert_eq!(first_byte_msb as u16, expected_msb);
    }

    #[test]
    fn repeated_symbol_needs_no_preamble_on_its_second_occurrence() {
        let source = to_units("aa");
        let encoded = encode(&source);
        let decoded = decode(encoded, source.len()).unwrap();
        assert_eq!(decoded, source);
    }

    #[test]
    fn empty_input_round_trips_to_empty_output() {
        let encoded = encode(&[]);
        let decoded = decode(encoded, 0).unwrap();
        assert_eq!(decoded, Vec::<CodeUnit>::new());
    }


    #[test]
    fn truncated_stream_is_a_truncated_error() {
        let source = to_units("abracadabra");
        let mut encoded = encode(&source);
        encoded.truncate(1);
        assert!(matches!(
            decode(encoded, source.len()),
            Err(JpackError::Truncated { .. })
        ));
    }

    #[test]
    fn node_numbering_tracks_non_decreasing_weight() {
        let source = to_units("mississippi river");
        let mut tree = VitterTree::new();
        let mut writer = BitWriter::new();
        for &c in &source {
            tree.encode_and_transmit(c, &mut writer);
        }
        let max_allocated = tree.next_alloc - 1;
        for a in 1..max_allocated {
            for b in (a + 1)..=max_allocated {
                assert!(tree.weight[a as usize] <= tree.weight[b as usize]);
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_holds_for_arbitrary_code_unit_sequences(
            source in proptest::collection::vec(0u16..500, 0..400)
        ) {
            let encoded = encode(&source);
            let decoded = decode(encoded, source.len()).unwrap();
            prop_assert_eq!(decoded, source);
        }
    }
}
