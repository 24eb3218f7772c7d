//! The symbol source / sink: a thin UTF-8 text reader with BOM detection on
//! the way in, and a plain UTF-8 writer on the way out. The engines never
//! see bytes — only the 16-bit code units this module decodes a text file
//! into (and re-encodes one into on the way out).
//!
//! The block pipeline's intermediate stream is a different kind of payload:
//! it's `MoveToFront`'s adapted output, which ranges over the *full*
//! 16-bit code-unit alphabet and can legitimately contain lone UTF-16
//! surrogates (0xD800–0xDFFF) that never pair up into a valid scalar value.
//! `String::from_utf16`/UTF-8 round-tripping rejects exactly those values,
//! so the intermediate temp file uses its own surrogate-tolerant byte
//! packing instead (`write_raw_code_units_to`/`read_raw_code_units`,
//! below) — the same CESU-8 convention of encoding every 16-bit code unit
//! independently, the way a real Unicode-adjacent text file format handles
//! unpaired surrogates, rather than pairing adjacent code units the way
//! UTF-16 decoding does.

use shared_files::errors::{JpackError, JpackResult};
use shared_files::CodeUnit;
use std::io::Write;
use std::path::Path;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Reads `path` as UTF-8 text, stripping a leading byte-order mark if
/// present, and returns its content unit-by-unit.
pub fn read_code_units(path: &Path) -> JpackResult<Vec<CodeUnit>> {
    let mut bytes = std::fs::read(path)?;
    if bytes.starts_with(&UTF8_BOM) {
        bytes.drain(0..UTF8_BOM.len());
    }
    let text = String::from_utf8(bytes)
        .map_err(|_| JpackError::malformed(format!("{} is not valid UTF-8", path.display())))?;
    Ok(text.encode_utf16().collect())
}

/// Re-encodes `units` as UTF-8 text and writes it to `path`, with no BOM.
pub fn write_code_units(path: &Path, units: &[CodeUnit]) -> JpackResult<()> {
    let text = String::from_utf16(units)
        .map_err(|_| JpackError::malformed("decoded code units are not valid UTF-16"))?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Encodes a single code unit in the CESU-8 convention: the same
/// 1/2/3-byte UTF-8 layout, but applied to the raw 16-bit value directly
/// rather than to a scalar value assembled from a surrogate pair. Every
/// value in 0..=0xFFFF, surrogate or not, maps to a unique byte sequence.
fn push_cesu8(out: &mut Vec<u8>, unit: CodeUnit) {
    match unit {
        0x0000..=0x007F => out.push(unit as u8),
        0x0080..=0x07FF => {
            out.push(0xC0 | (unit >> 6) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
        _ => {
            out.push(0xE0 | (unit >> 12) as u8);
            out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
    }
}

/// Decodes a CESU-8 byte stream produced by [`push_cesu8`] back into code
/// units, one at a time; unlike UTF-8 decoding, multi-byte sequences are
/// never combined across more than the three bytes of a single code unit.
fn decode_cesu8(bytes: &[u8]) -> JpackResult<Vec<CodeUnit>> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if b0 & 0x80 == 0 {
            units.push(b0 as u16);
            i += 1;
        } else if b0 & 0xE0 == 0xC0 {
            let b1 = *bytes
                .get(i + 1)
                .ok_or_else(|| JpackError::malformed("truncated CESU-8 sequence"))?;
            units.push(((b0 as u16 & 0x1F) << 6) | (b1 as u16 & 0x3F));
            i += 2;
        } else if b0 & 0xF0 == 0xE0 {
            let b1 = *bytes
                .get(i + 1)
                .ok_or_else(|| JpackError::malformed("truncated CESU-8 sequence"))?;
            let b2 = *bytes
                .get(i + 2)
                .ok_or_else(|| JpackError::malformed("truncated CESU-8 sequence"))?;
            units.push(((b0 as u16 & 0x0F) << 12) | ((b1 as u16 & 0x3F) << 6) | (b2 as u16 & 0x3F));
            i += 3;
        } else {
            return Err(JpackError::malformed("invalid CESU-8 lead byte"));
        }
    }
    Ok(units)
}

/// Writes `units` to an already-open writer using the surrogate-tolerant
/// CESU-8 packing — used for the block pipeline's intermediate temp file,
/// which the caller materialises and re-reads rather than writing to a
/// named path.
pub fn write_raw_code_units_to(writer: &mut impl Write, units: &[CodeUnit]) -> JpackResult<()> {
    let mut bytes = Vec::with_capacity(units.len());
    for &unit in units {
        push_cesu8(&mut bytes, unit);
    }
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Reads `path` back as a CESU-8-packed raw code-unit stream written by
/// [`write_raw_code_units_to`].
pub fn read_raw_code_units(path: &Path) -> JpackResult<Vec<CodeUnit>> {
    let bytes = std::fs::read(path)?;
    decode_cesu8(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_leading_utf8_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.txt");
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("abracadabra".as_bytes());
        std::fs::write(&path, bytes).unwrap();

        let units = read_code_units(&path).unwrap();
        assert_eq!(String::from_utf16(&units).unwrap(), "abracadabra");
    }

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, "mississippi river").unwrap();

        let units = read_code_units(&path).unwrap();
        let out_path = dir.path().join("out.txt");
        write_code_units(&out_path, &units).unwrap();

        assert_eq!(std::fs::read_to_string(&out_path).unwrap(), "mississippi river");
    }

    #[test]
    fn raw_round_trip_survives_lone_surrogates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.bin");
        // 0xD800 is a lone high surrogate with no following low surrogate —
        // invalid UTF-16, but a legal code unit in the full alphabet.
        let units: Vec<CodeUnit> = vec![0x0041, 0xD800, 0xDFFF, 0x0000, 0xFFFF, 0x07FF];

        let mut file = std::fs::File::create(&path).unwrap();
        write_raw_code_units_to(&mut file, &units).unwrap();
        drop(file);

        let decoded = read_raw_code_units(&path).unwrap();
        assert_eq!(decoded, units);
    }

    #[test]
    fn raw_round_trip_holds_for_every_code_unit_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all_units.bin");
        let units: Vec<CodeUnit> = (0u32..=0xFFFF).map(|v| v as CodeUnit).collect();

        let mut file = std::fs::File::create(&path).unwrap();
        write_raw_code_units_to(&mut file, &units).unwrap();
        drop(file);

        let decoded = read_raw_code_units(&path).unwrap();
        assert_eq!(decoded, units);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn raw_round_trip_holds_for_arbitrary_code_unit_sequences(
            units in proptest::collection::vec(0u16..=0xFFFFu16, 0..2000)
        ) {
            let mut bytes = Vec::new();
            write_raw_code_units_to(&mut bytes, &units).unwrap();
            let decoded = decode_cesu8(&bytes).unwrap();
            prop_assert_eq!(decoded, units);
        }
    }
}
