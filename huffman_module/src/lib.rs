//! Whole-file semi-adaptive (static) Huffman codec.
//!
//! Two passes: a frequency count over the full source, then construction of
//! an optimal prefix-code tree via a min-priority queue. The tree is
//! serialised in pre-order ahead of the code stream so the decoder can
//! rebuild the same tree before decoding any character. The literal tree is
//! transmitted wholesale rather than just a canonical code-length table,
//! since this alphabet (16-bit code units) makes length-only canonical
//! reconstruction no smaller a win than it is for a byte alphabet.

use bitstream_module::{BitReader, BitWriter};
use indexmap::IndexMap;
use shared_files::errors::{JpackError, JpackResult};
use shared_files::CodeUnit;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// A node of the static Huffman tree. Leaves carry a code unit; internal
/// nodes exist purely to route to their two children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanTree {
    Leaf(CodeUnit),
    Internal(Box<HuffmanTree>, Box<HuffmanTree>),
}

/// Counts occurrences of each code unit in `source`, in first-occurrence
/// order. `IndexMap` (rather than a plain hash map) is what makes the
/// priority queue's tie-breaking below deterministic and reproducible
/// between runs: ties are broken by insertion order, i.e. by the order
/// symbols first appear in the source.
fn count_frequencies(source: &[CodeUnit]) -> IndexMap<CodeUnit, u64> {
    let mut frequencies = IndexMap::new();
    for &c in source {
        *frequencies.entry(c).or_insert(0) += 1;
    }
    frequencies
}

/// Wraps a candidate tree in the priority queue with its weight and
/// insertion sequence number, so `BinaryHeap` (a max-heap) can be driven as
/// a min-heap on `(weight, sequence)` via `Reverse`.
struct HeapEntry {
    weight: u64,
    sequence: u64,
    tree: HuffmanTree,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.sequence == other.sequence
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.weight, self.sequence).cmp(&(other.weight, other.sequence))
    }
}

/// Builds the optimal prefix-code tree for the given frequency table.
/// Returns `None` for an empty table (no source characters).
pub fn build_tree(frequencies: &IndexMap<CodeUnit, u64>) -> Option<HuffmanTree> {
    use std::cmp::Reverse;

    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
    let mut sequence = 0u64;

    for (&c, &freq) in frequencies {
        heap.push(Reverse(HeapEntry {
            weight: freq,
            sequence,
            tree: HuffmanTree::Leaf(c),
        }));
        sequence += 1;
    }

    if heap.is_empty() {
        return None;
    }

    while heap.len() > 1 {
        let Reverse(zero) = heap.pop().unwrap();
        let Reverse(one) = heap.pop().unwrap();
        let combined = HeapEntry {
            weight: zero.weight + one.weight,
            sequence,
            tree: HuffmanTree::Internal(Box::new(zero.tree), Box::new(one.tree)),
        };
        sequence += 1;
        heap.push(Reverse(combined));
    }

    Some(heap.pop().unwrap().0.tree)
}

/// Depth-first walk assigning each leaf's root-to-leaf path as its code.
/// A single-leaf tree maps its one code unit to the empty bit string.
fn assign_codes(tree: &HuffmanTree) -> HashMap<CodeUnit, Vec<u8>> {
    let mut codes = HashMap::new();
    fn walk(node: &HuffmanTree, path: &mut Vec<u8>, codes: &mut HashMap<CodeUnit, Vec<u8>>) {
        match node {
            HuffmanTree::Leaf(c) => {
                codes.insert(*c, path.clone());
            }
            HuffmanTree::Internal(left, right) => {
                path.push(0);
                walk(left, path, codes);
                path.pop();
                path.push(1);
                walk(right, path, codes);
                path.pop();
            }
        }
    }
    let mut path = Vec::new();
    walk(tree, &mut path, &mut codes);
    codes
}

/// Serialises `tree` in pre-order: `1` + 16-bit code unit for a leaf, `0`
/// followed by the left then right subtree for an internal node.
fn serialize_tree(tree: &HuffmanTree, writer: &mut BitWriter) {
    match tree {
        HuffmanTree::Leaf(c) => {
            writer.write_bit(1);
            writer.write_code_unit(*c);
        }
        HuffmanTree::Internal(left, right) => {
            writer.write_bit(0);
            serialize_tree(left, writer);
            serialize_tree(right, writer);
        }
    }
}

fn deserialize_tree(reader: &mut BitReader) -> JpackResult<HuffmanTree> {
    let tag = reader.read_bit()?;
    if tag == 1 {
        Ok(HuffmanTree::Leaf(reader.read_code_unit()?))
    } else {
        let left = deserialize_tree(reader)?;
        let right = deserialize_tree(reader)?;
        Ok(HuffmanTree::Internal(Box::new(left), Box::new(right)))
    }
}

/// Walks `tree` one bit at a time from `reader`, returning the code unit at
/// the leaf reached. A tree that is itself a single leaf is resolved without
/// consuming any bits, matching the empty code assigned to it.
fn decode_symbol(tree: &HuffmanTree, reader: &mut BitReader) -> JpackResult<CodeUnit> {
    let mut node = tree;
    loop {
        match node {
            HuffmanTree::Leaf(c) => return Ok(*c),
            HuffmanTree::Internal(left, right) => {
                node = if reader.read_bit()? == 0 { left } else { right };
            }
        }
    }
}

/// Encodes `source` into the on-disk layout:
/// `[length-prefixed N] [serialised tree, omitted iff N == 0] [codes] [padding]`.
pub fn encode(source: &[CodeUnit]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    let n = source.len() as u64;
    writer.write_length_prefixed_long(n);

    if n == 0 {
        log::debug!("huffman_module::encode: empty source, writing bare N=0 header");
        return writer.close();
    }

    let frequencies = count_frequencies(source);
    let Some(tree) = build_tree(&frequencies) else {
        return writer.close();
    };
    log::debug!(
        "huffman_module::encode: {} distinct code units, {n} total",
        frequencies.len()
    );
    serialize_tree(&tree, &mut writer);

    let codes = assign_codes(&tree);
    for &c in source {
        let code = &codes[&c];
        for &bit in code {
            writer.write_bit(bit);
        }
    }

    writer.close()
}

/// Decodes a file produced by [`encode`] back into its source code units.
pub fn decode(bytes: Vec<u8>) -> JpackResult<Vec<CodeUnit>> {
    let mut reader = BitReader::new(bytes);
    let n = reader.read_length_prefixed_long()?;

    if n == 0 {
        return Ok(Vec::new());
    }

    let tree = deserialize_tree(&mut reader)?;
    let mut output = Vec::with_capacity(n as usize);
    for _ in 0..n {
        output.push(decode_symbol(&tree, &mut reader)?);
    }
    Ok(output)
}
