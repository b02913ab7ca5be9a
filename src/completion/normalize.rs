//! 전송 전 프롬프트 정규화 및 JSON 직렬화
//!
//! 특수 문자 때문에 API 요청이 400으로 실패하는 경우를 줄이기 위해
//! NFKD 정규화, 따옴표/대시 치환, 보이지 않는 문자 제거, 공백 압축을 수행합니다.

use std::io;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// 프롬프트 텍스트 정규화
pub fn normalize_prompt(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    for ch in text.nfkd() {
        match ch {
            '\u{201c}' | '\u{201d}' => folded.push('"'),
            '\u{2018}' | '\u{2019}' => folded.push('\''),
            '\u{2013}' | '\u{2014}' => folded.push('-'),
            '\u{2026}' => folded.push_str("..."),
            '\u{00a0}' => folded.push(' '),
            '\u{00ad}' | '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => {}
            _ => folded.push(ch),
        }
    }

    WHITESPACE.replace_all(&folded, " ").trim().to_string()
}

/// 요청 본문 직렬화
///
/// 비ASCII 문자를 그대로 두는 직렬화를 먼저 시도하고,
/// 실패하면 `\uXXXX` 이스케이프 직렬화로 다시 시도합니다.
pub fn encode_json<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string(payload).or_else(|e| {
        tracing::warn!("JSON encoding failed, retrying with ASCII escapes: {}", e);
        encode_json_ascii(payload)
    })
}

/// 비ASCII 문자를 모두 `\uXXXX`로 이스케이프하여 직렬화
pub fn encode_json_ascii<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter);
    payload.serialize(&mut serializer)?;
    // AsciiFormatter는 ASCII만 출력
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// 문자열 조각의 비ASCII 문자를 UTF-16 이스케이프로 출력하는 포매터
struct AsciiFormatter;

impl serde_json::ser::Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
