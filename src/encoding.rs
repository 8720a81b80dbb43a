//! Character-set detection and decoding for delimited text of unknown origin.
//!
//! [`detect_charset`] makes a deterministic best guess from raw bytes; [`TextDecoder`] turns a
//! charset label into a strict decoder. A wrong guess is not a detector error: the decoder
//! reports it as [`IngestionError::DecodeFailure`].

use std::borrow::Cow;
use std::fmt;

use encoding_rs::{DecoderResult, Encoding, GB18030, GBK, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

use crate::error::{IngestionError, IngestionResult};

/// Minimum share of double-byte pairs that must look like GB2312 hanzi/punctuation
/// (both bytes in `0xA1..=0xFE`) before non-UTF-8 input is treated as Chinese.
const GB_CORE_PAIR_RATIO: f64 = 0.5;

/// Best-guess character set of a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Charset {
    Utf8,
    Gbk,
    Gb18030,
    Iso8859_1,
    Utf16Le,
    Utf16Be,
}

impl Charset {
    /// Canonical label, accepted by [`TextDecoder::for_label`].
    pub fn label(self) -> &'static str {
        match self {
            Charset::Utf8 => "UTF-8",
            Charset::Gbk => "GBK",
            Charset::Gb18030 => "GB18030",
            Charset::Iso8859_1 => "ISO-8859-1",
            Charset::Utf16Le => "UTF-16LE",
            Charset::Utf16Be => "UTF-16BE",
        }
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guess the character set of `bytes`.
///
/// Never fails: empty input, pure ASCII and anything undecidable fall back to UTF-8.
///
/// Order of checks:
/// 1. byte-order mark
/// 2. valid UTF-8
/// 3. a strict GB18030 decode whose double-byte pairs are mostly GB2312 hanzi
///    (`GB18030` if four-byte sequences occur, `GBK` otherwise)
/// 4. ISO-8859-1
pub fn detect_charset(bytes: &[u8]) -> Charset {
    if bytes.is_empty() {
        return Charset::Utf8;
    }
    if let Some((enc, _)) = Encoding::for_bom(bytes) {
        return if enc == UTF_16LE {
            Charset::Utf16Le
        } else if enc == UTF_16BE {
            Charset::Utf16Be
        } else {
            Charset::Utf8
        };
    }
    if std::str::from_utf8(bytes).is_ok() {
        return Charset::Utf8;
    }

    match scan_gb_sequences(bytes) {
        Some(stats) if stats.looks_chinese() => {
            if stats.four_byte > 0 {
                Charset::Gb18030
            } else {
                Charset::Gbk
            }
        }
        _ => Charset::Iso8859_1,
    }
}

#[derive(Debug, Default)]
struct GbStats {
    two_byte: usize,
    core_pairs: usize,
    four_byte: usize,
}

impl GbStats {
    fn looks_chinese(&self) -> bool {
        let multi = self.two_byte + self.four_byte;
        if multi == 0 {
            return false;
        }
        (self.four_byte > 0 && self.two_byte == 0)
            || (self.core_pairs as f64 / multi as f64) >= GB_CORE_PAIR_RATIO
    }
}

/// Walk `bytes` as GB18030. Returns `None` on the first sequence that is not well formed.
fn scan_gb_sequences(bytes: &[u8]) -> Option<GbStats> {
    let mut stats = GbStats::default();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b < 0x80 {
            i += 1;
            continue;
        }
        if !(0x81..=0xFE).contains(&b) {
            return None;
        }
        let b2 = *bytes.get(i + 1)?;
        match b2 {
            0x30..=0x39 => {
                let b3 = *bytes.get(i + 2)?;
                let b4 = *bytes.get(i + 3)?;
                if !(0x81..=0xFE).contains(&b3) || !(0x30..=0x39).contains(&b4) {
                    return None;
                }
                stats.four_byte += 1;
                i += 4;
            }
            0x40..=0x7E | 0x80..=0xFE => {
                stats.two_byte += 1;
                if b >= 0xA1 && b2 >= 0xA1 {
                    stats.core_pairs += 1;
                }
                i += 2;
            }
            _ => return None,
        }
    }
    Some(stats)
}

/// Strict decoder for one charset.
///
/// Decoding never substitutes replacement characters: the first malformed byte sequence is
/// reported as [`IngestionError::DecodeFailure`] with its 1-based line number.
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    encoding: &'static Encoding,
    label: &'static str,
}

impl TextDecoder {
    /// Resolve a charset label (case-insensitive, WHATWG labels accepted).
    ///
    /// Unknown labels fail with [`IngestionError::UnsupportedEncoding`].
    pub fn for_label(label: &str) -> IngestionResult<Self> {
        let trimmed = label.trim();
        let encoding = match trimmed.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => UTF_8,
            "GBK" | "CP936" => GBK,
            "GB18030" => GB18030,
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => WINDOWS_1252,
            _ => Encoding::for_label(trimmed.as_bytes()).ok_or_else(|| {
                IngestionError::UnsupportedEncoding {
                    label: label.to_string(),
                }
            })?,
        };
        Ok(Self::new(encoding))
    }

    pub fn for_charset(charset: Charset) -> Self {
        let encoding = match charset {
            Charset::Utf8 => UTF_8,
            Charset::Gbk => GBK,
            Charset::Gb18030 => GB18030,
            Charset::Iso8859_1 => WINDOWS_1252,
            Charset::Utf16Le => UTF_16LE,
            Charset::Utf16Be => UTF_16BE,
        };
        Self::new(encoding)
    }

    fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            label: encoding.name(),
        }
    }

    /// WHATWG name of the underlying encoding.
    pub fn name(&self) -> &'static str {
        self.label
    }

    /// Decode `bytes` to text, stripping a leading BOM for this encoding.
    ///
    /// Valid UTF-8 input is borrowed, not copied.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> IngestionResult<Cow<'a, str>> {
        let body = strip_bom(self.encoding, bytes);

        if self.encoding == UTF_8 {
            return std::str::from_utf8(body)
                .map(Cow::Borrowed)
                .map_err(|e| self.failure(body, e.valid_up_to()));
        }

        let mut decoder = self.encoding.new_decoder_without_bom_handling();
        let capacity = decoder
            .max_utf8_buffer_length_without_replacement(body.len())
            .ok_or_else(|| IngestionError::MalformedSource {
                message: format!("input too large to decode ({} bytes)", body.len()),
            })?;
        let mut text = String::with_capacity(capacity);
        let (result, read) = decoder.decode_to_string_without_replacement(body, &mut text, true);
        match result {
            DecoderResult::InputEmpty => Ok(Cow::Owned(text)),
            DecoderResult::Malformed(bad, after) => {
                let offset = read.saturating_sub(bad as usize + after as usize);
                Err(self.failure(body, offset))
            }
            DecoderResult::OutputFull => Err(IngestionError::MalformedSource {
                message: "decoder output buffer exhausted".to_string(),
            }),
        }
    }

    fn failure(&self, body: &[u8], offset: usize) -> IngestionError {
        let line = body[..offset.min(body.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        IngestionError::DecodeFailure {
            encoding: self.label.to_string(),
            line,
        }
    }
}

fn strip_bom<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> &'a [u8] {
    match Encoding::for_bom(bytes) {
        Some((bom_enc, len)) if bom_enc == encoding => &bytes[len..],
        _ => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbk_bytes(s: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = GBK.encode(s);
        assert!(!had_errors);
        bytes.into_owned()
    }

    #[test]
    fn empty_and_ascii_default_to_utf8() {
        assert_eq!(detect_charset(b""), Charset::Utf8);
        assert_eq!(detect_charset(b"a,b\n1,2\n"), Charset::Utf8);
    }

    #[test]
    fn utf8_chinese_is_utf8() {
        assert_eq!(detect_charset("姓名,更新时间\n".as_bytes()), Charset::Utf8);
    }

    #[test]
    fn gbk_chinese_is_detected() {
        let bytes = gbk_bytes("姓名,更新时间\n张三,2024年01月02日\n");
        assert_eq!(detect_charset(&bytes), Charset::Gbk);
    }

    #[test]
    fn four_byte_sequences_mean_gb18030() {
        let text = "姓名,备注\n张三,𠀀\n";
        let (bytes, _, had_errors) = GB18030.encode(text);
        assert!(!had_errors);
        assert!(bytes.windows(4).any(|w| w == [0x95, 0x32, 0x82, 0x36]));
        assert_eq!(detect_charset(&bytes), Charset::Gb18030);

        let dec = TextDecoder::for_charset(Charset::Gb18030);
        assert_eq!(dec.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn latin1_text_is_iso_8859_1() {
        // "café,naïve" in ISO-8859-1
        let bytes = b"caf\xe9,na\xefve\n";
        assert_eq!(detect_charset(bytes), Charset::Iso8859_1);
    }

    #[test]
    fn boms_win() {
        assert_eq!(detect_charset(b"\xEF\xBB\xBFa,b"), Charset::Utf8);
        assert_eq!(detect_charset(b"\xFF\xFEa\x00"), Charset::Utf16Le);
    }

    #[test]
    fn detection_is_deterministic() {
        let bytes = gbk_bytes("中文内容");
        assert_eq!(detect_charset(&bytes), detect_charset(&bytes));
    }

    #[test]
    fn decode_gbk_round_trips_text() {
        let bytes = gbk_bytes("姓名,更新时间");
        let dec = TextDecoder::for_charset(Charset::Gbk);
        assert_eq!(dec.decode(&bytes).unwrap(), "姓名,更新时间");
    }

    #[test]
    fn decode_utf8_strips_bom_and_borrows() {
        let dec = TextDecoder::for_label("utf-8").unwrap();
        let out = dec.decode(b"\xEF\xBB\xBFname").unwrap();
        assert!(matches!(out, Cow::Borrowed("name")));
    }

    #[test]
    fn decode_failure_reports_line() {
        let dec = TextDecoder::for_label("UTF-8").unwrap();
        let err = dec.decode(b"a,b\nok,1\nbad\xff,2\n").unwrap_err();
        match err {
            IngestionError::DecodeFailure { encoding, line } => {
                assert_eq!(encoding, "UTF-8");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_label_is_unsupported() {
        let err = TextDecoder::for_label("klingon-8").unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn latin1_labels_decode_high_bytes() {
        let dec = TextDecoder::for_label("ISO-8859-1").unwrap();
        assert_eq!(dec.decode(b"caf\xe9").unwrap(), "café");
    }
}
