//! Text/binary classification and encoding detection
//!
//! Pure, synchronous inspection of byte buffers: BOM recognition, NUL-pattern
//! heuristics for UTF-16 without a BOM, and legacy-encoding detection via
//! `chardetng` for everything else.

use crate::models::FileContentInfo;

/// Byte order mark signatures
const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];
const BOM_UTF32_LE: &[u8] = &[0xFF, 0xFE, 0x00, 0x00];
const BOM_UTF32_BE: &[u8] = &[0x00, 0x00, 0xFE, 0xFF];

/// Sample the head of the buffer for statistics
const SAMPLE_SIZE: usize = 8192;

/// A NUL run this long is a binary file, full stop
const NUL_RUN_BINARY_THRESHOLD: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bom {
    Utf8,
    Utf16Le,
    Utf16Be,
    /// UTF-32 is not a text encoding this system accepts: too many binary
    /// formats alias its BOM bytes
    Utf32,
}

fn detect_bom(data: &[u8]) -> Option<Bom> {
    // Check UTF-32 before UTF-16 since UTF-32LE starts with FF FE too
    if data.len() >= 4 && (data[..4] == *BOM_UTF32_BE || data[..4] == *BOM_UTF32_LE) {
        return Some(Bom::Utf32);
    }
    if data.len() >= 3 && data[..3] == *BOM_UTF8 {
        return Some(Bom::Utf8);
    }
    if data.len() >= 2 && data[..2] == *BOM_UTF16_BE {
        return Some(Bom::Utf16Be);
    }
    if data.len() >= 2 && data[..2] == *BOM_UTF16_LE {
        return Some(Bom::Utf16Le);
    }
    None
}

/// Classify a byte buffer as text (with encoding) or binary
pub fn inspect(data: &[u8]) -> FileContentInfo {
    if data.is_empty() {
        return FileContentInfo::text("UTF-8", 1.0, "", 0);
    }

    match detect_bom(data) {
        Some(Bom::Utf32) => FileContentInfo::binary(1.0, data.len()),
        Some(Bom::Utf8) => {
            // Decode the whole buffer so the BOM character is retained
            let (decoded, _) = encoding_rs::UTF_8.decode_without_bom_handling(data);
            FileContentInfo::text("UTF-8", 1.0, decoded.into_owned(), data.len())
        }
        Some(Bom::Utf16Le) => {
            let (decoded, _) = encoding_rs::UTF_16LE.decode_without_bom_handling(data);
            FileContentInfo::text("UTF-16LE", 1.0, decoded.into_owned(), data.len())
        }
        Some(Bom::Utf16Be) => {
            let (decoded, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(data);
            FileContentInfo::text("UTF-16BE", 1.0, decoded.into_owned(), data.len())
        }
        None => classify_without_bom(data),
    }
}

fn classify_without_bom(data: &[u8]) -> FileContentInfo {
    let sample = &data[..data.len().min(SAMPLE_SIZE)];
    let stats = ByteStats::collect(sample);

    // NUL bytes are valid UTF-8, so the NUL heuristics must run before the
    // UTF-8 fast path or UTF-16/binary buffers would be mislabeled as UTF-8
    if stats.nul_count > 0 {
        // Alternating-NUL pattern consistent with BOM-less UTF-16?
        if let Some((encoding, name)) = stats.utf16_candidate(sample.len()) {
            let (decoded, had_errors) = encoding.decode_without_bom_handling(data);
            if !had_errors && looks_like_text(&decoded) {
                return FileContentInfo::text(name, 0.6, decoded.into_owned(), data.len());
            }
        }
        return FileContentInfo::binary(stats.binary_confidence(sample.len()), data.len());
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let confidence = if data.is_ascii() { 1.0 } else { 0.95 };
        return FileContentInfo::text("UTF-8", confidence, text, data.len());
    }

    if stats.control_count * 10 > sample.len() {
        return FileContentInfo::binary(stats.binary_confidence(sample.len()), data.len());
    }

    // Not UTF-*, not binary-looking: likely a legacy single/multi-byte
    // encoding (windows-1252, Shift_JIS, ...)
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(sample, true);
    let (encoding, is_reliable) = detector.guess_assess(None, true);

    let (decoded, had_errors) = encoding.decode_without_bom_handling(data);
    if had_errors || !looks_like_text(&decoded) {
        return FileContentInfo::binary(0.5, data.len());
    }

    let confidence = if is_reliable { 0.9 } else { 0.5 };
    FileContentInfo::text(
        encoding.name().to_uppercase(),
        confidence,
        decoded.into_owned(),
        data.len(),
    )
}

struct ByteStats {
    nul_count: usize,
    control_count: usize,
    longest_nul_run: usize,
    even_nuls: usize,
    odd_nuls: usize,
}

impl ByteStats {
    fn collect(sample: &[u8]) -> Self {
        let mut stats = Self {
            nul_count: 0,
            control_count: 0,
            longest_nul_run: 0,
            even_nuls: 0,
            odd_nuls: 0,
        };
        let mut run = 0usize;
        for (index, &byte) in sample.iter().enumerate() {
            if byte == 0 {
                stats.nul_count += 1;
                if index % 2 == 0 {
                    stats.even_nuls += 1;
                } else {
                    stats.odd_nuls += 1;
                }
                run += 1;
                stats.longest_nul_run = stats.longest_nul_run.max(run);
            } else {
                run = 0;
                // Control chars except tab(9), LF(10), VT(11), FF(12), CR(13), ESC(27)
                if byte < 8 || (byte > 13 && byte < 32 && byte != 27) {
                    stats.control_count += 1;
                }
            }
        }
        stats
    }

    /// UTF-16 text stores ASCII with NULs on exactly one side of each pair.
    /// Require a dominant side and a quiet opposite side so evenly-NUL
    /// buffers (plain binary) don't qualify.
    fn utf16_candidate(
        &self,
        sample_len: usize,
    ) -> Option<(&'static encoding_rs::Encoding, &'static str)> {
        let half = sample_len / 2;
        if half == 0 {
            return None;
        }
        let dominant = half * 2 / 5;
        let quiet = half / 5;
        if self.odd_nuls > dominant && self.even_nuls < quiet {
            return Some((encoding_rs::UTF_16LE, "UTF-16LE"));
        }
        if self.even_nuls > dominant && self.odd_nuls < quiet {
            return Some((encoding_rs::UTF_16BE, "UTF-16BE"));
        }
        None
    }

    fn binary_confidence(&self, sample_len: usize) -> f64 {
        let nul_fraction = self.nul_count as f64 / sample_len as f64;
        if self.longest_nul_run >= NUL_RUN_BINARY_THRESHOLD || nul_fraction > 0.9 {
            return 1.0;
        }
        let control_fraction = self.control_count as f64 / sample_len as f64;
        (0.5 + nul_fraction + control_fraction).min(1.0)
    }
}

/// Decoded output should be mostly printable to count as text
fn looks_like_text(decoded: &str) -> bool {
    let mut total = 0usize;
    let mut control = 0usize;
    for ch in decoded.chars() {
        total += 1;
        if ch.is_control() && !matches!(ch, '\t' | '\n' | '\r') {
            control += 1;
        }
    }
    total > 0 && control * 10 <= total
}
