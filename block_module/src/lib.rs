//! Block pipeline: chunks a code-unit stream into fixed-size blocks, applies
//! BWT then MTF on the way down and MTF⁻¹ then BWT⁻¹ on the way up, and
//! frames each block with a 3-hex-digit primary-index header.

use bwt_module::BwtBlock;
use mtf_module::MoveToFront;
use shared_files::constants::{BLOCK_HEADER_SIZE, BLOCK_SIZE};
use shared_files::errors::{JpackError, JpackResult};
use shared_files::CodeUnit;

fn hex_digit(c: char) -> CodeUnit {
    c as CodeUnit
}

/// Renders `primary_index` as an uppercase hex string, left-padded with `0`
/// to exactly [`BLOCK_HEADER_SIZE`] code units.
fn render_header(primary_index: usize) -> Vec<CodeUnit> {
    format!("{:0width$X}", primary_index, width = BLOCK_HEADER_SIZE)
        .chars()
        .map(hex_digit)
        .collect()
}

/// Parses a header back into a primary index. `Malformed` on invalid hex.
fn parse_header(header: &[CodeUnit]) -> JpackResult<usize> {
    let text = String::from_utf16(header)
        .map_err(|_| JpackError::malformed("block header is not valid UTF-16"))?;
    usize::from_str_radix(&text, 16)
        .map_err(|_| JpackError::malformed(format!("invalid hex in block header: {text:?}")))
}

/// Encodes `source` into the intermediate stream consumed by the static
/// Huffman stage: `[header ‖ MTF(BWT(block))]` repeated for every
/// `BLOCK_SIZE`-sized chunk (the last chunk may be shorter).
pub fn compress(source: &[CodeUnit]) -> Vec<CodeUnit> {
    let mut mtf = MoveToFront::new();
    let mut intermediate = Vec::with_capacity(source.len() + source.len() / BLOCK_SIZE * BLOCK_HEADER_SIZE);

    for chunk in source.chunks(BLOCK_SIZE) {
        let block = bwt_module::transform(chunk);
        log::debug!(
            "block_module::compress: block of {} code units, primary_index={}",
            chunk.len(),
            block.primary_index
        );
        intermediate.extend(render_header(block.primary_index));
        intermediate.extend(mtf.transform(&block.last_column));
    }

    intermediate
}

/// Decodes the intermediate stream back into the original code-unit source.
pub fn decompress(intermediate: &[CodeUnit]) -> JpackResult<Vec<CodeUnit>> {
    let mut mtf = MoveToFront::new();
    let mut output = Vec::with_capacity(intermediate.len());
    let mut pos = 0usize;

    while pos < intermediate.len() {
        let remaining = intermediate.len() - pos;
        if remaining < BLOCK_HEADER_SIZE {
            return Err(JpackError::malformed("truncated block header"));
        }
        let header = &intermediate[pos..pos + BLOCK_HEADER_SIZE];
        pos += BLOCK_HEADER_SIZE;

        let content_len = BLOCK_SIZE.min(intermediate.len() - pos);
        if content_len == 0 {
            return Err(JpackError::malformed(
                "block header present but no content followed it",
            ));
        }
        let content = &intermediate[pos..pos + content_len];
        pos += content_len;

        let primary_index = parse_header(header)?;
        let last_column = mtf.reverse(content);
        log::debug!(
            "block_module::decompress: block of {content_len} code units, primary_index={primary_index}"
        );
        let block = BwtBlock {
            last_column,
            primary_index,
        };
        output.extend(bwt_module::inverse(&block));
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
    fn round_trips_a_single_short_block() {
        let source = to_units("abracadabra");
        let intermediate = compress(&source);
        let restored = decompress(&intermediate).unwrap();
        assert_eq!(from_units(&restored), "abracadabra");
    }

    #[test]
    fn produces_two_blocks_at_the_8192_character_boundary() {
        let source = vec![b'x' as CodeUnit; 2 * BLOCK_SIZE];
        let intermediate = compress(&source);
        // Each block contributes a 3-code-unit header plus BLOCK_SIZE content.
        assert_eq!(intermediate.len(), 2 * (BLOCK_HEADER_SIZE + BLOCK_SIZE));
        let restored = decompress(&intermediate).unwrap();
        assert_eq!(restored, source);
    }

    #[test]
    fn header_with_no_content_is_malformed() {
        let mut intermediate = render_header(0);
        // Drop the content entirely; only the header remains.
        let err = decompress(&mut intermediate).unwrap_err();
        assert!(matches!(err, JpackError::Malformed { .. }));
    }

    #[test]
    fn empty_input_round_trips_to_empty_output() {
        let intermediate = compress(&[]);
        assert!(intermediate.is_empty());
        assert_eq!(decompress(&intermediate).unwrap(), Vec::<CodeUnit>::new());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip_holds_across_several_blocks(
            source in proptest::collection::vec(0u16..=0xFFFFu16, 0..(BLOCK_SIZE * 3))
        ) {
            let intermediate = compress(&source);
            let restored = decompress(&intermediate).unwrap();
            prop_assert_eq!(restored, source);
        }
    }
}
