//! Burrows–Wheeler transform and its inverse, over the 16-bit code-unit
//! alphabet.
//!
//! The forward transform sorts rotation *offsets* into the source block
//! rather than materialising the full rotation matrix. The inverse rebuilds
//! the `prevMatch`/`nbLessThan` tables from the last column and walks the
//! LF-mapping back to the original block.

use shared_files::CodeUnit;

/// The result of the forward transform: the last column of the sorted
/// rotation matrix, and the row at which the original (`offset == 0`)
/// rotation landed after sorting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BwtBlock {
    pub last_column: Vec<CodeUnit>,
    pub primary_index: usize,
}

/// Compares two rotations of `source`, identified by their starting offsets,
/// lexicographically over the full block length.
fn compare_rotations(source: &[CodeUnit], a: usize, b: usize) -> std::cmp::Ordering {
    let n = source.len();
    for i in 0..n {
        let ca = source[(a + i) % n];
        let cb = source[(b + i) % n];
        match ca.cmp(&cb) {
            std::cmp::Ordering::Equal => continue,
            other => return other,
        }
    }
    std::cmp::Ordering::Equal
}

/// Forward BWT of a single block. The block pipeline never hands this an
/// empty `source`, but an empty block is still handled here, yielding an
/// empty last column with `primary_index == 0`.
pub fn transform(source: &[CodeUnit]) -> BwtBlock {
    let n = source.len();
    if n == 0 {
        return BwtBlock {
            last_column: Vec::new(),
            primary_index: 0,
        };
    }

    let mut offsets: Vec<usize> = (0..n).collect();
    offsets.sort_by(|&a, &b| compare_rotations(source, a, b));

    let mut last_column = Vec::with_capacity(n);
    let mut primary_index = 0;
    for (rank, &offset) in offsets.iter().enumerate() {
        last_column.push(source[(offset + n - 1) % n]);
        if offset == 0 {
            primary_index = rank;
        }
    }

    log::debug!(
        "bwt::transform: block of {n} code units, primary_index={primary_index}"
    );

    BwtBlock {
        last_column,
        primary_index,
    }
}

/// Inverse BWT: reconstructs the source block from its last column and
/// primary index via the LF-mapping walk.
pub fn inverse(block: &BwtBlock) -> Vec<CodeUnit> {
    let l = &block.last_column;
    let n = l.len();
    if n == 0 {
        return Vec::new();
    }

    // prevMatch[i] = number of positions j < i with L[j] == L[i].
    let mut seen_counts: std::collections::HashMap<CodeUnit, usize> =
        std::collections::HashMap::with_capacity(n);
    let mut prev_match = vec![0usize; n];
    for (i, &c) in l.iter().enumerate() {
        let counter = seen_counts.entry(c).or_insert(0);
        prev_match[i] = *counter;
        *counter += 1;
    }

    // nb_less_than[c] = count of characters in L strictly smaller than c.
    let mut freq = vec![0u64; shared_files::ALPHABET_SIZE];
    for &c in l.iter() {
        freq[c as usize] += 1;
    }
    let mut nb_less_than = vec![0u64; shared_files::ALPHABET_SIZE];
    let mut running = 0u64;
    for c in 0..shared_files::ALPHABET_SIZE {
        nb_less_than[c] = running;
        running += freq[c];
    }

    let mut reversed = Vec::with_capacity(n);
    let mut pos = block.primary_index;
    for _ in 0..n {
        reversed.push(l[pos]);
        pos = (nb_less_than[l[pos] as usize] as usize) + prev_match[pos];
    }

    reversed.reverse();
    reversed
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
    fn abracadabra_has_the_expected_last_column_and_primary_index() {
        let source = to_units("abracadabra");
        let block = transform(&source);
        assert_eq!(from_units(&block.last_column), "rdarcaaaabb");
        assert_eq!(block.primary_index, 2);
    }

    #[test]
    fn single_character_block_is_its_own_transform() {
        let source = to_units("a");
        let block = transform(&source);
        assert_eq!(block.last_column, source);
        assert_eq!(block.primary_index, 0);
    }

    #[test]
    fn empty_block_round_trips_trivially() {
        let block = transform(&[]);
        assert_eq!(block.last_column, Vec::<CodeUnit>::new());
        assert_eq!(block.primary_index, 0);
        assert_eq!(inverse(&block), Vec::<CodeUnit>::new());
    }

    #[test]
    fn round_trip_recovers_the_source_block() {
        for text in ["abracadabra", "mississippi", "a", "aaaaaaaaaa", "banana bread"] {
            let source = to_units(text);
            let block = transform(&source);
            assert_eq!(inverse(&block), source);
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_holds_for_arbitrary_non_empty_blocks(
            source in proptest::collection::vec(0u16..200, 1..200)
        ) {
            let block = transform(&source);
            prop_assert_eq!(inverse(&block), source);
        }
    }
}
