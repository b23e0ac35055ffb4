//! Delimited-text payload handling.
//!
//! Only the header record is parsed and rewritten. Everything after it is
//! copied through byte-for-byte, so data rows keep their exact quoting,
//! spacing, and line endings.

use thiserror::Error;

use crate::constants::output::{FIELD_DELIMITER, QUOTE};
use crate::utils::normalize_identifier;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Why a payload could not be rewritten.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(String),
    #[error("payload has no header row")]
    MissingHeader,
}

/// Header record of a payload and everything that follows it.
#[derive(Debug, PartialEq, Eq)]
pub struct HeaderSplit<'a> {
    /// Header record without its terminator.
    pub header: &'a str,
    /// Terminator that ended the header record, empty when the payload had only a header.
    pub terminator: &'a str,
    /// Remaining payload, untouched.
    pub rest: &'a str,
}

/// Split off the first record, honoring newlines inside quoted fields.
///
/// A quote opens a quoted field only at the start of that field, matching
/// [`parse_record`]; a stray quote mid-field is literal text. Returns `None`
/// when the first record is blank.
pub fn split_header_record(text: &str) -> Option<HeaderSplit<'_>> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut end = None;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if in_quotes {
            if ch == QUOTE {
                if matches!(chars.peek(), Some(&(_, QUOTE))) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            continue;
        }
        match ch {
            QUOTE if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            FIELD_DELIMITER => at_field_start = true,
            '\n' => {
                end = Some(idx);
                break;
            }
            _ => at_field_start = false,
        }
    }

    let (header, terminator, rest) = match end {
        Some(idx) if idx > 0 && text.as_bytes()[idx - 1] == b'\r' => {
            (&text[..idx - 1], &text[idx - 1..=idx], &text[idx + 1..])
        }
        Some(idx) => (&text[..idx], &text[idx..=idx], &text[idx + 1..]),
        None => (text, "", ""),
    };
    if header.trim().is_empty() {
        return None;
    }
    Some(HeaderSplit {
        header,
        terminator,
        rest,
    })
}

/// Parse one record into its fields (double-quote quoting, `""` escapes).
pub fn parse_record(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = record.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == QUOTE {
                if chars.peek() == Some(&QUOTE) {
                    field.push(QUOTE);
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else if ch == FIELD_DELIMITER {
            fields.push(std::mem::take(&mut field));
        } else if ch == QUOTE && field.is_empty() {
            in_quotes = true;
        } else {
            field.push(ch);
        }
    }
    fields.push(field);
    fields
}

/// Render fields as one record, quoting only fields that need it.
pub fn format_record<S: AsRef<str>>(fields: &[S]) -> String {
    let mut out = String::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(FIELD_DELIMITER);
        }
        let field = field.as_ref();
        let needs_quotes = field
            .chars()
            .any(|ch| ch == FIELD_DELIMITER || ch == QUOTE || ch == '\n' || ch == '\r');
        if needs_quotes {
            out.push(QUOTE);
            for ch in field.chars() {
                if ch == QUOTE {
                    out.push(QUOTE);
                }
                out.push(ch);
            }
            out.push(QUOTE);
        } else {
            out.push_str(field);
        }
    }
    out
}

/// Normalize every header cell of `payload` and pass the data rows through.
pub fn rewrite_header(payload: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let text = std::str::from_utf8(payload).map_err(|err| PayloadError::NotUtf8(err.to_string()))?;
    let split = split_header_record(text).ok_or(PayloadError::MissingHeader)?;
    let normalized: Vec<String> = parse_record(split.header)
        .iter()
        .map(|cell| normalize_identifier(cell))
        .collect();

    let header = format_record(&normalized);
    let terminator = if split.terminator.is_empty() {
        "\n"
    } else {
        split.terminator
    };
    let mut out = Vec::with_capacity(header.len() + terminator.len() + split.rest.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(terminator.as_bytes());
    out.extend_from_slice(split.rest.as_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_header_record_handles_lf_and_crlf() {
        let split = split_header_record("a,b\n1,2\n").unwrap();
        assert_eq!(split.header, "a,b");
        assert_eq!(split.terminator, "\n");
        assert_eq!(split.rest, "1,2\n");

        let split = split_header_record("a,b\r\n1,2\r\n").unwrap();
        assert_eq!(split.header, "a,b");
        assert_eq!(split.terminator, "\r\n");
        assert_eq!(split.rest, "1,2\r\n");
    }

    #[test]
    fn split_header_record_keeps_quoted_newlines_in_header() {
        let split = split_header_record("\"Line\none\",b\n1,2").unwrap();
        assert_eq!(split.header, "\"Line\none\",b");
        assert_eq!(split.rest, "1,2");
    }

    #[test]
    fn split_header_record_treats_mid_field_quote_as_literal() {
        let split = split_header_record("Height 5\",Name\nA,B\nC,D\n").unwrap();
        assert_eq!(split.header, "Height 5\",Name");
        assert_eq!(split.rest, "A,B\nC,D\n");
    }

    #[test]
    fn split_header_record_keeps_escaped_quotes_inside_quoted_field() {
        let split = split_header_record("\"Say \"\"hi\"\"\nthere\",b\n1,2\n").unwrap();
        assert_eq!(split.header, "\"Say \"\"hi\"\"\nthere\",b");
        assert_eq!(split.rest, "1,2\n");
    }

    #[test]
    fn split_header_record_rejects_blank_first_record() {
        assert!(split_header_record("").is_none());
        assert!(split_header_record("\n1,2\n").is_none());
        assert!(split_header_record("\u{feff}").is_none());
    }

    #[test]
    fn split_header_record_accepts_header_without_terminator() {
        let split = split_header_record("only,header").unwrap();
        assert_eq!(split.header, "only,header");
        assert_eq!(split.terminator, "");
        assert_eq!(split.rest, "");
    }

    #[test]
    fn parse_record_unquotes_and_unescapes() {
        assert_eq!(
            parse_record("plain,\"with, comma\",\"say \"\"hi\"\"\",,end"),
            vec!["plain", "with, comma", "say \"hi\"", "", "end"]
        );
        assert_eq!(parse_record(""), vec![""]);
    }

    #[test]
    fn format_record_quotes_only_when_needed() {
        assert_eq!(format_record(&["a", "b c"]), "a,b c");
        assert_eq!(
            format_record(&["x,y", "say \"hi\""]),
            "\"x,y\",\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn rewrite_header_normalizes_header_and_preserves_rows_exactly() {
        let payload =
            "\u{feff}Facility Name,\"Hospital's Type\",% of Patients (2023)\r\n\"Mercy, General\", Acute ,12.5\r\nSt. Jude,,\"7\"\r\n";
        let rewritten = rewrite_header(payload.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(rewritten).unwrap(),
            "facility_name,hospitals_type,of_patients_2023\r\n\"Mercy, General\", Acute ,12.5\r\nSt. Jude,,\"7\"\r\n"
        );
    }

    #[test]
    fn rewrite_header_leaves_rows_alone_after_stray_header_quote() {
        let rewritten = rewrite_header(b"Height 5\",Name\nA,B\nC,D\n").unwrap();
        assert_eq!(rewritten, b"height_5,name\nA,B\nC,D\n");
    }

    #[test]
    fn rewrite_header_terminates_header_only_payload() {
        let rewritten = rewrite_header(b"Provider ID,State").unwrap();
        assert_eq!(rewritten, b"provider_id,state\n");
    }

    #[test]
    fn rewrite_header_rejects_empty_and_non_utf8_payloads() {
        assert_eq!(rewrite_header(b""), Err(PayloadError::MissingHeader));
        assert!(matches!(
            rewrite_header(&[0xff, 0xfe, b'a']),
            Err(PayloadError::NotUtf8(_))
        ));
    }
}
