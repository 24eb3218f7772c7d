//! Constants shared between the block pipeline and the CLI driver.

/// Number of code units per block in the block pipeline.
pub const BLOCK_SIZE: usize = 4096;

/// Width, in code units, of the hexadecimal primary-index header written
/// before each block's content. `BLOCK_SIZE <= 0xFFF + 1`, so three hex
/// digits always suffice to hold a primary index in `[0, BLOCK_SIZE)`.
pub const BLOCK_HEADER_SIZE: usize = 3;

/// File extension used for the primary (BWT/MTF/static-Huffman) codec's
/// compressed output.
pub const COMPRESSED_EXTENSION: &str = ".pck";

/// Index-shift constant for the adapted MTF encoding: `'A' = 0x0041`.
pub const MTF_SHIFT_START: u16 = 0x0041;
