//! Wires the engine crates together into the two codecs `jpack` exposes,
//! and into the round-trip self-test.
//!
//! The primary codec composes `block_module` (BWT + MTF) and
//! `huffman_module` through a `tempfile::NamedTempFile` holding the
//! surrogate-tolerant raw intermediate stream (`text_io::write_raw_code_units_to`):
//! stage 1 closes that file before stage 2 opens it, so the handoff is
//! strictly sequential. The Vitter codec (`vitter_module`)
//! runs directly against the source/destination with no intermediate file.
//! `jpack` additionally prefixes its output with a length-prefixed
//! source-symbol count using the same bit-stream primitive the static
//! codec uses for its own header, because stopping decode on "no more bits
//! to read" alone is not reliable for small alphabets: a handful of
//! trailing zero-padding bits can coincidentally trace a path to an
//! already-existing leaf and produce a spurious extra symbol instead of a
//! clean truncation. See DESIGN.md for the full note.

use bitstream_module::{BitReader, BitWriter};
use shared_files::errors::JpackResult;
use shared_files::stats::{CompressionStats, CompressionStatsBuilder, StatsTimer};
use shared_files::CodeUnit;
use std::path::Path;
use vitter_module::VitterTree;

use crate::text_io;

const ALGORITHM_BWT: &str = "BWT + Move-to-Front + static Huffman";
const ALGORITHM_VITTER: &str = "Vitter adaptive Huffman";

/// Runs `body`, returning its result alongside a `CompressionStats` report
/// comparing `original_len` against `processed_len`.
fn with_stats<T>(
    algorithm_name: &'static str,
    is_compression: bool,
    original_len: usize,
    body: impl FnOnce(&mut StatsTimer) -> JpackResult<(T, usize)>,
) -> JpackResult<(T, CompressionStats)> {
    let mut timer = StatsTimer::new();
    let (value, processed_len) = body(&mut timer)?;
    let (duration, sections) = timer.end();
    let stats = CompressionStatsBuilder::new()
        .algorithm_name(algorithm_name)
        .algorithm_id(if is_compression { 1 } else { 0 })
        .version_used(1)
        .original_len(original_len)
        .processed_len(processed_len)
        .duration(duration)
        .is_compression(is_compression)
        .sections(sections)
        .build()
        .expect("every builder field is set above");
    Ok((value, stats))
}

/// Compresses `source` into `destination` via the BWT/MTF/static-Huffman
/// pipeline.
pub fn compress_bwt(source: &Path, destination: &Path) -> JpackResult<CompressionStats> {
    let original_len = std::fs::metadata(source)?.len() as usize;

    let ((), stats) = with_stats(ALGORITHM_BWT, true, original_len, |timer| {
        let read_timer = timer.start_section("read source");
        let units = text_io::read_code_units(source)?;
        timer.add_section(read_timer.end());

        let block_timer = timer.start_section("BWT + MTF block pipeline");
        let intermediate = block_module::compress(&units);
        timer.add_section(block_timer.end());

        let temp_timer = timer.start_section("materialize intermediate file");
        let mut temp = tempfile::NamedTempFile::new()?;
        text_io::write_raw_code_units_to(&mut temp, &intermediate)?;
        let intermediate_roundtrip = text_io::read_raw_code_units(temp.path())?;
        timer.add_section(temp_timer.end());

        let huffman_timer = timer.start_section("static Huffman encode");
        let encoded = huffman_module::encode(&intermediate_roundtrip);
        timer.add_section(huffman_timer.end());

        let write_timer = timer.start_section("write destination");
        std::fs::write(destination, &encoded)?;
        timer.add_section(write_timer.end());

        Ok(((), encoded.len()))
    })?;

    Ok(stats)
}

/// Decompresses `source` into `destination`, reversing [`compress_bwt`].
pub fn decompress_bwt(source: &Path, destination: &Path) -> JpackResult<CompressionStats> {
    let original_len = std::fs::metadata(source)?.len() as usize;

    let ((), stats) = with_stats(ALGORITHM_BWT, false, original_len, |timer| {
        let read_timer = timer.start_section("read source");
        let bytes = std::fs::read(source)?;
        timer.add_section(read_timer.end());

        let huffman_timer = timer.start_section("static Huffman decode");
        let intermediate = huffman_module::decode(bytes)?;
        timer.add_section(huffman_timer.end());

        let temp_timer = timer.start_section("materialize intermediate file");
        let mut temp = tempfile::NamedTempFile::new()?;
        text_io::write_raw_code_units_to(&mut temp, &intermediate)?;
        let intermediate_roundtrip = text_io::read_raw_code_units(temp.path())?;
        timer.add_section(temp_timer.end());

        let block_timer = timer.start_section("MTF\u{207b}\u{00b9} + BWT\u{207b}\u{00b9} block pipeline");
        let units = block_module::decompress(&intermediate_roundtrip)?;
        timer.add_section(block_timer.end());

        let write_timer = timer.start_section("write destination");
        text_io::write_code_units(destination, &units)?;
        let processed_len = std::fs::metadata(destination)?.len() as usize;
        timer.add_section(write_timer.end());

        Ok(((), processed_len))
    })?;

    Ok(stats)
}

/// Compresses `source` into `destination` via the standalone Vitter
/// adaptive-Huffman codec. The destination carries a length-prefixed
/// source-symbol count ahead of the bit stream `encode` produces; see the
/// module-level note for why.
pub fn compress_vitter(source: &Path, destination: &Path) -> JpackResult<CompressionStats> {
    let original_len = std::fs::metadata(source)?.len() as usize;

    let ((), stats) = with_stats(ALGORITHM_VITTER, true, original_len, |timer| {
        let read_timer = timer.start_section("read source");
        let units = text_io::read_code_units(source)?;
        timer.add_section(read_timer.end());

        let encode_timer = timer.start_section("Vitter adaptive Huffman encode");
        let encoded = encode_vitter_with_length(&units);
        timer.add_section(encode_timer.end());

        let write_timer = timer.start_section("write destination");
        std::fs::write(destination, &encoded)?;
        timer.add_section(write_timer.end());

        Ok(((), encoded.len()))
    })?;

    Ok(stats)
}

/// Decompresses `source` into `destination`, reversing [`compress_vitter`].
pub fn decompress_vitter(source: &Path, destination: &Path) -> JpackResult<CompressionStats> {
    let original_len = std::fs::metadata(source)?.len() as usize;

    let ((), stats) = with_stats(ALGORITHM_VITTER, false, original_len, |timer| {
        let read_timer = timer.start_section("read source");
        let bytes = std::fs::read(source)?;
        timer.add_section(read_timer.end());

        let decode_timer = timer.start_section("Vitter adaptive Huffman decode");
        let units = decode_vitter_with_length(bytes)?;
        timer.add_section(decode_timer.end());

        let write_timer = timer.start_section("write destination");
        text_io::write_code_units(destination, &units)?;
        let processed_len = std::fs::metadata(destination)?.len() as usize;
        timer.add_section(write_timer.end());

        Ok(((), processed_len))
    })?;

    Ok(stats)
}

fn encode_vitter_with_length(units: &[CodeUnit]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.write_length_prefixed_long(units.len() as u64);
    let mut tree = VitterTree::new();
    for &c in units {
        tree.encode_and_transmit(c, &mut writer);
    }
    writer.close()
}

fn decode_vitter_with_length(bytes: Vec<u8>) -> JpackResult<Vec<CodeUnit>> {
    let mut reader = BitReader::new(bytes);
    let len = reader.read_length_prefixed_long()?;
    let mut tree = VitterTree::new();
    let mut output = Vec::with_capacity(len as usize);
    for _ in 0..len {
        output.push(tree.decode_and_receive(&mut reader)?);
    }
    Ok(output)
}

/// Runs the `-t` round-trip self-test: compresses `<stem>.txt` to
/// `<stem>.pck`, decompresses that back to `<stem>-R.txt`, and reports
/// whether the two text files are byte-for-byte identical.
pub fn self_test(stem: &Path, use_vitter: bool) -> JpackResult<bool> {
    let source_txt = append_suffix(stem, ".txt");
    let compressed = append_suffix(stem, ".pck");
    let restored_txt = append_suffix(stem, "-R.txt");

    if use_vitter {
        compress_vitter(&source_txt, &compressed)?;
        decompress_vitter(&compressed, &restored_txt)?;
    } else {
        compress_bwt(&source_txt, &compressed)?;
        decompress_bwt(&compressed, &restored_txt)?;
    }

    let original = std::fs::read(&source_txt)?;
    let restored = std::fs::read(&restored_txt)?;
    let matches = original == restored;
    if !matches {
        log::warn!(
            "self-test mismatch: {} and {} differ after round-trip",
            source_txt.display(),
            restored_txt.display()
        );
    }
    Ok(matches)
}

fn append_suffix(stem: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    std::path::PathBuf::from(name)
}
