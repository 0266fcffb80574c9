// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Content type sniffing for uploaded objects

/// Only the leading bytes are inspected
const SNIFF_LEN: usize = 512;

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Guess a MIME type from the payload's leading bytes.
///
/// Recognises markup, a handful of binary signatures and falls back to
/// UTF-8 text when no control bytes are present. JSON payloads come out
/// as `text/plain; charset=utf-8`.
pub fn detect_content_type(data: &[u8]) -> String {
    let data = &data[..data.len().min(SNIFF_LEN)];

    let start = data
        .iter()
        .position(|b| !is_whitespace(*b))
        .unwrap_or(data.len());
    let trimmed = &data[start..];

    if HTML_TAGS.iter().any(|tag| matches_tag(trimmed, tag)) {
        return mime::TEXT_HTML_UTF_8.to_string();
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8".to_string();
    }

    let signature = if data.starts_with(b"%PDF-") {
        Some(mime::APPLICATION_PDF.to_string())
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(mime::IMAGE_PNG.to_string())
    } else if data.starts_with(b"\xFF\xD8\xFF") {
        Some(mime::IMAGE_JPEG.to_string())
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(mime::IMAGE_GIF.to_string())
    } else if data.starts_with(b"\x1F\x8B\x08") {
        Some("application/x-gzip".to_string())
    } else if data.starts_with(b"PK\x03\x04") {
        Some("application/zip".to_string())
    } else if data.starts_with(b"\xEF\xBB\xBF") {
        Some(mime::TEXT_PLAIN_UTF_8.to_string())
    } else if data.starts_with(b"\xFE\xFF") {
        Some("text/plain; charset=utf-16be".to_string())
    } else if data.starts_with(b"\xFF\xFE") {
        Some("text/plain; charset=utf-16le".to_string())
    } else {
        None
    };
    if let Some(content_type) = signature {
        return content_type;
    }

    if data.iter().any(|b| is_binary(*b)) {
        mime::APPLICATION_OCTET_STREAM.to_string()
    } else {
        mime::TEXT_PLAIN_UTF_8.to_string()
    }
}

/// Case-insensitive tag prefix followed by a space or '>'
fn matches_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() {
        return false;
    }
    let prefix_matches = data
        .iter()
        .zip(tag)
        .all(|(d, t)| d.to_ascii_uppercase() == *t);
    prefix_matches && matches!(data[tag.len()], b' ' | b'>')
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}
