use std::fs;
use std::path::Path;
use tracing::{trace, warn};

use crate::errors::{SearchError, SearchResult};

/// How a file's bytes were turned into text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

impl Decoding {
    fn label(self) -> &'static str {
        match self {
            Decoding::Utf8 => "UTF-8",
            Decoding::Utf16Le => "UTF-16 LE",
            Decoding::Utf16Be => "UTF-16 BE",
            Decoding::Latin1 => "Latin-1",
        }
    }
}

/// Decodes file bytes, trying encodings from strict to permissive.
///
/// Strict UTF-8 first, then UTF-16 when a byte-order mark says so, then a
/// single-byte Latin-1 read that maps every byte to a char and therefore
/// cannot fail. The last step can mis-render unusual byte sequences; that
/// trade-off buys a scan that never gives up on a readable file.
fn decode_bytes(bytes: Vec<u8>) -> (String, Decoding) {
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => return (text, Decoding::Utf8),
        Err(e) => e.into_bytes(),
    };

    // UTF-16 LE BOM: 0xFF 0xFE
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        return (String::from_utf16_lossy(&utf16), Decoding::Utf16Le);
    }

    // UTF-16 BE BOM: 0xFE 0xFF
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return (String::from_utf16_lossy(&utf16), Decoding::Utf16Be);
    }

    (bytes.iter().map(|&b| b as char).collect(), Decoding::Latin1)
}

/// Lazy iterator over the matching lines of one file.
///
/// Single pass, safe to abandon early; the file handle is already closed by
/// the time this exists, so dropping it mid-iteration releases everything.
#[derive(Debug)]
pub struct ScanMatches {
    text: String,
    pos: usize,
    line_number: usize,
    needle: String,
    case_sensitive: bool,
}

impl Iterator for ScanMatches {
    type Item = (usize, String);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let (line_end, next_pos) = match rest.find('\n') {
                Some(i) => (i, self.pos + i + 1),
                None => (rest.len(), self.text.len()),
            };
            let mut line = &rest[..line_end];
            if line.ends_with('\r') {
                line = &line[..line.len() - 1];
            }
            self.pos = next_pos;
            self.line_number += 1;

            let hit = if self.case_sensitive {
                line.contains(self.needle.as_str())
            } else {
                line.to_lowercase().contains(self.needle.as_str())
            };
            if hit {
                return Some((self.line_number, line.to_string()));
            }
        }
        None
    }
}

/// Opens one file and returns its matching lines as (line number, text)
/// pairs, 1-based, with line endings stripped and other whitespace kept.
///
/// The term is normalized once up front: verbatim when `case_sensitive`,
/// lower-cased otherwise, and each line is compared in the same form.
pub fn scan(path: &Path, term: &str, case_sensitive: bool) -> SearchResult<ScanMatches> {
    trace!("Scanning file: {}", path.display());

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SearchError::file_not_found(path),
        std::io::ErrorKind::PermissionDenied => SearchError::permission_denied(path),
        _ => SearchError::IoError(e),
    })?;

    let (text, decoding) = decode_bytes(bytes);
    if decoding != Decoding::Utf8 {
        warn!(
            "File {} is not valid UTF-8, decoded as {}",
            path.display(),
            decoding.label()
        );
    }

    let needle = if case_sensitive {
        term.to_string()
    } else {
        term.to_lowercase()
    };

    Ok(ScanMatches {
        text,
        pos: 0,
        line_number: 0,
        needle,
        case_sensitive,
    })
}
