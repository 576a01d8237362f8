use error_stack::{IntoReport, Report, ResultExt};
use serde::{Deserialize, Serialize};

use crate::normalizer::{NormalizerError, NormalizerResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    #[strum(serialize = "utf-8")]
    Utf8,
    #[serde(rename = "utf-16")]
    #[strum(serialize = "utf-16")]
    Utf16,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> NormalizerResult<String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(bytes.to_vec())
                    .into_report()
                    .change_context(NormalizerError)
            }
            TextEncoding::Utf16 => decode_utf16(bytes),
        }
    }
}

// Without a byte order mark the text is assumed to be little endian.
fn decode_utf16(bytes: &[u8]) -> NormalizerResult<String> {
    let (bytes, big_endian) = if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        (rest, true)
    } else {
        (bytes.strip_prefix(UTF16_LE_BOM).unwrap_or(bytes), false)
    };
    if bytes.len() % 2 != 0 {
        return Err(Report::new(NormalizerError)
            .attach_printable(format!("odd number of bytes ({}) for utf-16", bytes.len())));
    }
    let units = bytes.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .into_report()
        .change_context(NormalizerError)
}

/// Tries every encoding in order and returns the first successful decoding.
pub fn decode_export(
    bytes: &[u8],
    encodings: &[TextEncoding],
) -> NormalizerResult<(String, TextEncoding)> {
    let mut last_error = None;
    for encoding in encodings {
        match encoding.decode(bytes) {
            Ok(text) => return Ok((text, *encoding)),
            Err(report) => {
                log::debug!("Playlist is not valid {encoding}, trying the next encoding");
                last_error = Some(report.attach_printable(format!("Not valid {encoding}")));
            }
        }
    }
    let tried = encodings
        .iter()
        .map(|encoding| encoding.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    Err(last_error
        .unwrap_or_else(|| Report::new(NormalizerError))
        .attach_printable(format!("Could not decode the playlist, tried: [{tried}]")))
}
